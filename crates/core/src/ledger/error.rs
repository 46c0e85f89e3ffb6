//! Ledger error types.
//!
//! Every failure the engine can report, grouped into the kinds callers act
//! on: validation (fix input, retry), lookup (fix the reference, retry),
//! integrity (stop, needs review) and persistence.

use chrono::NaiveDate;
use kasa_shared::AppError;
use kasa_shared::types::{CashAccountId, Currency, PostingId, RateId, TenantId, TransferId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Broad error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any state change.
    Validation,
    /// Missing or unusable reference.
    Lookup,
    /// Precondition violated during the operation.
    Integrity,
    /// The journal could not make the operation durable.
    Persistence,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount is not positive or has more decimals than the currency allows.
    #[error("Invalid amount {amount} for {currency}")]
    InvalidAmount {
        /// The rejected amount.
        amount: Decimal,
        /// Currency the amount was given in.
        currency: Currency,
    },

    /// Exchange rate must be positive (and 1 between identical currencies).
    #[error("Invalid exchange rate {0}")]
    InvalidRate(Decimal),

    /// The result would exceed the decimal range of the account's figures.
    #[error("Amount overflow on account {0}")]
    AmountOverflow(CashAccountId),

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SameAccount(CashAccountId),

    /// An operator description is required.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// An account name is required.
    #[error("Account name cannot be empty")]
    EmptyName,

    /// Currency code is malformed.
    #[error("Invalid currency code: '{0}'")]
    InvalidCurrency(String),

    /// The effective date falls in a fiscal year that is already closed.
    #[error("Fiscal year {0} is closed, no posting allowed")]
    PeriodClosed(i32),

    // ========== Lookup Errors ==========
    /// Tenant has not been opened in this ledger.
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(CashAccountId),

    /// Account is inactive and cannot be used.
    #[error("Account {0} is inactive")]
    AccountInactive(CashAccountId),

    /// Posting not found.
    #[error("Posting not found: {0}")]
    PostingNotFound(PostingId),

    /// Transfer not found.
    #[error("Transfer not found: {0}")]
    TransferNotFound(TransferId),

    /// No direct, inverse or cross rate resolves for the pair on the date.
    #[error("No exchange rate found for {base} to {quote} on {date}")]
    RateNotFound {
        /// Base currency code.
        base: Currency,
        /// Quote currency code.
        quote: Currency,
        /// Date for which the rate was requested.
        date: NaiveDate,
    },

    /// Exchange rate version not found.
    #[error("Exchange rate version not found: {0}")]
    RateVersionNotFound(RateId),

    // ========== Integrity Errors ==========
    /// Running balance disagrees with the aggregate-derived balance.
    #[error(
        "Balance drift on account {account_id}: running balance {running_balance}, physical balance {physical_balance}"
    )]
    BalanceDrift {
        /// The drifted account.
        account_id: CashAccountId,
        /// Stored running balance.
        running_balance: Decimal,
        /// carry_forward + income - expense + transfer_in - transfer_out.
        physical_balance: Decimal,
    },

    /// Posting or transfer has already been reversed.
    #[error("{0} has already been reversed")]
    AlreadyReversed(String),

    /// Fiscal year already closed for the tenant.
    #[error("Fiscal year {year} is already closed for tenant {tenant_id}")]
    AlreadyClosed {
        /// The tenant.
        tenant_id: TenantId,
        /// The closed year.
        year: i32,
    },

    /// Tenant already opened in this ledger.
    #[error("Tenant {0} is already open")]
    TenantAlreadyOpen(TenantId),

    // ========== Persistence Errors ==========
    /// The journal rejected the operation; nothing was applied.
    #[error("Journal error: {0}")]
    Journal(String),
}

impl LedgerError {
    /// Returns the error category.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAmount { .. }
            | Self::InvalidRate(_)
            | Self::AmountOverflow(_)
            | Self::SameAccount(_)
            | Self::EmptyDescription
            | Self::EmptyName
            | Self::InvalidCurrency(_)
            | Self::PeriodClosed(_) => ErrorKind::Validation,

            Self::TenantNotFound(_)
            | Self::AccountNotFound(_)
            | Self::AccountInactive(_)
            | Self::PostingNotFound(_)
            | Self::TransferNotFound(_)
            | Self::RateNotFound { .. }
            | Self::RateVersionNotFound(_) => ErrorKind::Lookup,

            Self::BalanceDrift { .. }
            | Self::AlreadyReversed(_)
            | Self::AlreadyClosed { .. }
            | Self::TenantAlreadyOpen(_) => ErrorKind::Integrity,

            Self::Journal(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the error code for callers.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount { .. } => "INVALID_AMOUNT",
            Self::InvalidRate(_) => "INVALID_RATE",
            Self::AmountOverflow(_) => "AMOUNT_OVERFLOW",
            Self::SameAccount(_) => "SAME_ACCOUNT",
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::EmptyName => "EMPTY_NAME",
            Self::InvalidCurrency(_) => "INVALID_CURRENCY",
            Self::TenantNotFound(_) => "TENANT_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::PostingNotFound(_) => "POSTING_NOT_FOUND",
            Self::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            Self::RateNotFound { .. } => "RATE_NOT_FOUND",
            Self::RateVersionNotFound(_) => "RATE_VERSION_NOT_FOUND",
            Self::PeriodClosed(_) => "PERIOD_CLOSED",
            Self::BalanceDrift { .. } => "BALANCE_DRIFT",
            Self::AlreadyReversed(_) => "ALREADY_REVERSED",
            Self::AlreadyClosed { .. } => "ALREADY_CLOSED",
            Self::TenantAlreadyOpen(_) => "TENANT_ALREADY_OPEN",
            Self::Journal(_) => "JOURNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry after correcting input or references.
    ///
    /// The engine itself never retries.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::Lookup)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::Lookup => Self::NotFound(message),
            ErrorKind::Integrity => Self::Integrity(message),
            ErrorKind::Persistence => Self::Database(message),
        }
    }
}
