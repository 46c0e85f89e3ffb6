//! Exchange rate types.

use chrono::{DateTime, NaiveDate, Utc};
use kasa_shared::types::{Currency, RateId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One dated version of a directional quotation.
///
/// `1 base = rate quote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Unique identifier of this version.
    pub id: RateId,
    /// Base currency.
    pub base: Currency,
    /// Quote currency.
    pub quote: Currency,
    /// Quote units per one unit of base.
    pub rate: Decimal,
    /// First date this version applies to.
    pub effective_from: NaiveDate,
    /// Optional free-text note (source, bank, ...).
    pub note: Option<String>,
    /// Inactive versions are kept for audit but never resolved.
    pub is_active: bool,
    /// Insertion order; breaks ties between versions with the same date.
    pub sequence: u64,
    /// When the version was recorded.
    pub created_at: DateTime<Utc>,
}

/// How a rate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Same currency, rate 1.
    Identity,
    /// Direct quote base -> quote.
    Direct,
    /// Opposite-direction quote, inverted.
    Inverse,
    /// Derived through the tenant's home currency.
    CrossRate,
    /// Supplied by the caller at transfer time.
    Override,
}

impl RateSource {
    /// Returns the string representation of the source.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Direct => "direct",
            Self::Inverse => "inverse",
            Self::CrossRate => "cross_rate",
            Self::Override => "override",
        }
    }

    /// Parses a source from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "identity" => Some(Self::Identity),
            "direct" => Some(Self::Direct),
            "inverse" => Some(Self::Inverse),
            "cross_rate" => Some(Self::CrossRate),
            "override" => Some(Self::Override),
            _ => None,
        }
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of resolving a rate for a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateQuote {
    /// Base currency.
    pub base: Currency,
    /// Quote currency.
    pub quote: Currency,
    /// Quote units per one unit of base.
    pub rate: Decimal,
    /// How the rate was obtained.
    pub source: RateSource,
    /// Effective date of the (oldest) version used.
    pub effective_from: NaiveDate,
}

impl RateQuote {
    /// The identity quote between a currency and itself.
    #[must_use]
    pub fn identity(currency: Currency, as_of: NaiveDate) -> Self {
        Self {
            base: currency,
            quote: currency,
            rate: Decimal::ONE,
            source: RateSource::Identity,
            effective_from: as_of,
        }
    }
}
