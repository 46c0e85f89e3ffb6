//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any state change.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found or not usable.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Precondition violated while the operation ran; needs human review.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl AppError {
    /// Returns the error code for callers.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Integrity(_) => "INTEGRITY_VIOLATION",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns true if the caller may retry after correcting its input.
    ///
    /// Integrity failures are never retryable without review.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
