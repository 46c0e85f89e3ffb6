//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Home currency assigned to tenants opened without an explicit one.
    #[serde(default = "default_home_currency")]
    pub default_home_currency: String,
    /// Fractional digits kept on inverse and cross rates.
    #[serde(default = "default_derived_rate_scale")]
    pub derived_rate_scale: u32,
    /// Default number of versions returned by a rate history query.
    #[serde(default = "default_history_limit")]
    pub default_history_limit: usize,
}

fn default_home_currency() -> String {
    "TRY".to_string()
}

fn default_derived_rate_scale() -> u32 {
    10
}

fn default_history_limit() -> usize {
    50
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_home_currency: default_home_currency(),
            derived_rate_scale: default_derived_rate_scale(),
            default_history_limit: default_history_limit(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("KASA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
