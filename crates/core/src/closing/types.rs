//! Period-closing types.

use chrono::{DateTime, Utc};
use kasa_shared::types::{CashAccountId, ClosingId, Currency, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a tenant-year stands in the closing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClosingStatus {
    /// Nothing computed yet.
    Open,
    /// A preview has been produced.
    Previewed,
    /// Closed; terminal.
    Applied,
}

impl ClosingStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Previewed => "previewed",
            Self::Applied => "applied",
        }
    }
}

impl fmt::Display for ClosingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accrued-but-unsettled amounts per account, supplied by the caller.
///
/// Accounts not listed accrue zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accruals(BTreeMap<CashAccountId, Decimal>);

impl Accruals {
    /// No accruals at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the accrual of one account.
    #[must_use]
    pub fn with(mut self, account_id: CashAccountId, amount: Decimal) -> Self {
        self.0.insert(account_id, amount);
        self
    }

    /// Accrued amount of an account.
    #[must_use]
    pub fn get(&self, account_id: CashAccountId) -> Decimal {
        self.0.get(&account_id).copied().unwrap_or(Decimal::ZERO)
    }

    /// Accounts with an explicit accrual.
    pub fn accounts(&self) -> impl Iterator<Item = CashAccountId> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(CashAccountId, Decimal)> for Accruals {
    fn from_iter<I: IntoIterator<Item = (CashAccountId, Decimal)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<CashAccountId, Decimal>> for Accruals {
    fn from(map: BTreeMap<CashAccountId, Decimal>) -> Self {
        Self(map)
    }
}

/// One account's figures at the period boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingLine {
    /// The account.
    pub account_id: CashAccountId,
    /// Account name at closing time.
    pub account_name: String,
    /// Account currency.
    pub currency: Currency,
    /// Whether the account was active at closing time.
    pub active: bool,
    /// Carry-forward the period opened with.
    pub prior_carry_forward: Decimal,
    /// Period income.
    pub period_income: Decimal,
    /// Period expense.
    pub period_expense: Decimal,
    /// Transfers in minus transfers out.
    pub net_transfer: Decimal,
    /// Balance derived from the aggregates; equals the running balance.
    pub physical_balance: Decimal,
    /// Caller-supplied unsettled amount.
    pub accrued_amount: Decimal,
    /// `physical_balance - accrued_amount`.
    pub free_balance: Decimal,
    /// `free_balance + accrued_amount`; the next period's carry-forward.
    pub new_carry_forward: Decimal,
}

/// Result of a closing preview. Nothing has been changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingPreview {
    /// The tenant.
    pub tenant_id: TenantId,
    /// Fiscal year being closed.
    pub fiscal_year: i32,
    /// One line per included account.
    pub lines: Vec<ClosingLine>,
    /// When the preview was computed.
    pub generated_at: DateTime<Utc>,
}

impl ClosingPreview {
    /// Sum of new carry-forwards per currency, `None` if a total overflows.
    #[must_use]
    pub fn totals_by_currency(&self) -> Option<BTreeMap<Currency, Decimal>> {
        totals_by_currency(&self.lines)
    }
}

/// The permanent audit artifact of a year-end rollover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClosingRecord {
    /// Unique identifier.
    pub id: ClosingId,
    /// The tenant.
    pub tenant_id: TenantId,
    /// Closed fiscal year.
    pub fiscal_year: i32,
    /// Operator description.
    pub description: String,
    /// Per-account snapshot.
    pub lines: Vec<ClosingLine>,
    /// When the closing was applied.
    pub applied_at: DateTime<Utc>,
}

impl PeriodClosingRecord {
    /// Sum of new carry-forwards per currency, `None` if a total overflows.
    #[must_use]
    pub fn totals_by_currency(&self) -> Option<BTreeMap<Currency, Decimal>> {
        totals_by_currency(&self.lines)
    }

    /// Line of one account, if it was part of the closing.
    #[must_use]
    pub fn line(&self, account_id: CashAccountId) -> Option<&ClosingLine> {
        self.lines.iter().find(|l| l.account_id == account_id)
    }
}

fn totals_by_currency(lines: &[ClosingLine]) -> Option<BTreeMap<Currency, Decimal>> {
    let mut totals = BTreeMap::new();
    for line in lines {
        let total = totals.entry(line.currency).or_insert(Decimal::ZERO);
        *total = total.checked_add(line.new_carry_forward)?;
    }
    Some(totals)
}
