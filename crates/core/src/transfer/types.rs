//! Transfer types.

use chrono::{DateTime, NaiveDate, Utc};
use kasa_shared::types::{CashAccountId, Currency, TenantId, TransferId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::RateSource;
use crate::ledger::AccountDelta;

/// Lifecycle of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// Both legs are in effect.
    Completed,
    /// Both legs were compensated.
    Reversed,
}

impl TransferStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Reversed => "reversed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "completed" => Some(Self::Completed),
            "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }
}

/// Input for moving value between two accounts of one tenant.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// Account debited.
    pub source_account_id: CashAccountId,
    /// Account credited.
    pub destination_account_id: CashAccountId,
    /// Positive amount in the source currency.
    pub amount: Decimal,
    /// Effective date; also the rate lookup date.
    pub effective_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Caller-supplied rate, recorded verbatim instead of the resolved one.
    pub rate_override: Option<Decimal>,
}

/// An executed transfer, kept for audit and reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique identifier.
    pub id: TransferId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Account debited.
    pub source_account_id: CashAccountId,
    /// Account credited.
    pub destination_account_id: CashAccountId,
    /// Amount debited, in the source currency.
    pub source_amount: Decimal,
    /// Source account currency.
    pub source_currency: Currency,
    /// Rate applied (`1 source = rate destination`).
    pub rate: Decimal,
    /// How the rate was obtained.
    pub rate_source: RateSource,
    /// Effective date of the rate version used.
    pub rate_effective_from: NaiveDate,
    /// Amount credited, in the destination currency.
    pub destination_amount: Decimal,
    /// Destination account currency.
    pub destination_currency: Currency,
    /// Effective date.
    pub effective_date: NaiveDate,
    /// Free-text description.
    pub description: String,
    /// Completed or reversed.
    pub status: TransferStatus,
    /// When the transfer was executed.
    pub created_at: DateTime<Utc>,
    /// When the transfer was reversed, if it was.
    pub reversed_at: Option<DateTime<Utc>>,
}

impl Transfer {
    /// Returns true if the transfer has been reversed.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.status == TransferStatus::Reversed
    }

    /// Returns true if the transfer crossed currencies.
    #[must_use]
    pub fn is_cross_currency(&self) -> bool {
        self.source_currency != self.destination_currency
    }

    /// Returns true if the account is either leg of the transfer.
    #[must_use]
    pub fn involves(&self, account_id: CashAccountId) -> bool {
        self.source_account_id == account_id || self.destination_account_id == account_id
    }

    /// Delta applied to the source account.
    #[must_use]
    pub fn debit(&self) -> AccountDelta {
        AccountDelta::transfer_out(self.source_amount)
    }

    /// Delta applied to the destination account.
    #[must_use]
    pub fn credit(&self) -> AccountDelta {
        AccountDelta::transfer_in(self.destination_amount)
    }

    /// Returns the reversed copy of this transfer.
    #[must_use]
    pub fn reversed(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: TransferStatus::Reversed,
            reversed_at: Some(now),
            ..self.clone()
        }
    }
}
