//! Cash accounts and the single balance-mutation primitive.
//!
//! Every committed account row satisfies
//! `running_balance == carry_forward + period_income - period_expense
//!  + period_transfer_in - period_transfer_out`.

use chrono::{DateTime, Utc};
use kasa_shared::types::{CashAccountId, Currency, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::LedgerError;

/// Kind of register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Cash in hand.
    Cash,
    /// Bank account.
    Bank,
}

impl AccountKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Bank => "bank",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cash" => Some(Self::Cash),
            "bank" => Some(Self::Bank),
            _ => None,
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The four period-to-date counters of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodAggregate {
    /// `period_income`
    Income,
    /// `period_expense`
    Expense,
    /// `period_transfer_in`
    TransferIn,
    /// `period_transfer_out`
    TransferOut,
}

/// A balance change plus the matching change to exactly one aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountDelta {
    /// Signed change to `running_balance`.
    pub balance: Decimal,
    /// Aggregate that moves with the balance.
    pub aggregate: PeriodAggregate,
    /// Signed change to that aggregate.
    pub aggregate_delta: Decimal,
}

impl AccountDelta {
    /// Income increases both balance and `period_income`.
    #[must_use]
    pub fn income(amount: Decimal) -> Self {
        Self {
            balance: amount,
            aggregate: PeriodAggregate::Income,
            aggregate_delta: amount,
        }
    }

    /// Expense decreases the balance and increases `period_expense`.
    #[must_use]
    pub fn expense(amount: Decimal) -> Self {
        Self {
            balance: -amount,
            aggregate: PeriodAggregate::Expense,
            aggregate_delta: amount,
        }
    }

    /// Debit leg of a transfer.
    #[must_use]
    pub fn transfer_out(amount: Decimal) -> Self {
        Self {
            balance: -amount,
            aggregate: PeriodAggregate::TransferOut,
            aggregate_delta: amount,
        }
    }

    /// Credit leg of a transfer.
    #[must_use]
    pub fn transfer_in(amount: Decimal) -> Self {
        Self {
            balance: amount,
            aggregate: PeriodAggregate::TransferIn,
            aggregate_delta: amount,
        }
    }

    /// The compensating delta: same aggregate, opposite signs.
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            balance: -self.balance,
            aggregate: self.aggregate,
            aggregate_delta: -self.aggregate_delta,
        }
    }
}

/// A cash or bank register of one tenant, denominated in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashAccount {
    /// Unique identifier.
    pub id: CashAccountId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Display name.
    pub name: String,
    /// Currency of every amount on this account.
    pub currency: Currency,
    /// Cash in hand or bank.
    pub kind: AccountKind,
    /// Current balance.
    pub running_balance: Decimal,
    /// Opening balance of the current period.
    pub carry_forward: Decimal,
    /// Period-to-date income.
    pub period_income: Decimal,
    /// Period-to-date expense.
    pub period_expense: Decimal,
    /// Period-to-date transfers received.
    pub period_transfer_in: Decimal,
    /// Period-to-date transfers sent.
    pub period_transfer_out: Decimal,
    /// Inactive accounts reject postings and transfers.
    pub is_active: bool,
    /// Incremented on every committed mutation.
    pub version: i64,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account last changed.
    pub updated_at: DateTime<Utc>,
}

impl CashAccount {
    /// Creates an active account with all balances and aggregates at zero.
    #[must_use]
    pub fn new(
        tenant_id: TenantId,
        name: String,
        currency: Currency,
        kind: AccountKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CashAccountId::new(),
            tenant_id,
            name,
            currency,
            kind,
            running_balance: Decimal::ZERO,
            carry_forward: Decimal::ZERO,
            period_income: Decimal::ZERO,
            period_expense: Decimal::ZERO,
            period_transfer_in: Decimal::ZERO,
            period_transfer_out: Decimal::ZERO,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Balance derived from the carry-forward and the period aggregates.
    ///
    /// `None` if the sum leaves the decimal range.
    #[must_use]
    pub fn physical_balance(&self) -> Option<Decimal> {
        self.carry_forward
            .checked_add(self.period_income)?
            .checked_sub(self.period_expense)?
            .checked_add(self.net_transfer()?)
    }

    /// `period_transfer_in - period_transfer_out`, `None` on overflow.
    #[must_use]
    pub fn net_transfer(&self) -> Option<Decimal> {
        self.period_transfer_in
            .checked_sub(self.period_transfer_out)
    }

    /// Returns true if the running balance matches the derived balance.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.physical_balance() == Some(self.running_balance)
    }

    /// Fails with `BalanceDrift` if the running balance disagrees with the
    /// aggregates, or `AmountOverflow` if they cannot be summed at all.
    pub fn check_balance(&self) -> Result<(), LedgerError> {
        let physical_balance = self
            .physical_balance()
            .ok_or(LedgerError::AmountOverflow(self.id))?;
        if physical_balance == self.running_balance {
            Ok(())
        } else {
            Err(LedgerError::BalanceDrift {
                account_id: self.id,
                running_balance: self.running_balance,
                physical_balance,
            })
        }
    }

    /// Returns true if any period aggregate is non-zero.
    #[must_use]
    pub fn has_period_activity(&self) -> bool {
        !(self.period_income.is_zero()
            && self.period_expense.is_zero()
            && self.period_transfer_in.is_zero()
            && self.period_transfer_out.is_zero())
    }

    /// Fails with `AccountInactive` if the account is deactivated.
    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.is_active {
            Ok(())
        } else {
            Err(LedgerError::AccountInactive(self.id))
        }
    }

    /// Stages a mutation: returns the updated row without touching `self`.
    ///
    /// Rejects inactive accounts and re-checks the balance invariant on the
    /// result.
    pub(crate) fn apply_delta(
        &self,
        delta: AccountDelta,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        self.ensure_active()?;

        let overflow = || LedgerError::AmountOverflow(self.id);
        let mut next = self.clone();
        next.running_balance = next
            .running_balance
            .checked_add(delta.balance)
            .ok_or_else(overflow)?;
        let aggregate = match delta.aggregate {
            PeriodAggregate::Income => &mut next.period_income,
            PeriodAggregate::Expense => &mut next.period_expense,
            PeriodAggregate::TransferIn => &mut next.period_transfer_in,
            PeriodAggregate::TransferOut => &mut next.period_transfer_out,
        };
        *aggregate = aggregate
            .checked_add(delta.aggregate_delta)
            .ok_or_else(overflow)?;
        next.version += 1;
        next.updated_at = now;

        next.check_balance()?;
        Ok(next)
    }

    /// Stages the year-end rollover: new carry-forward, zeroed aggregates.
    ///
    /// The running balance is left as is; it already equals the new
    /// carry-forward when the books are consistent.
    pub(crate) fn roll_forward(&self, new_carry_forward: Decimal, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.carry_forward = new_carry_forward;
        next.period_income = Decimal::ZERO;
        next.period_expense = Decimal::ZERO;
        next.period_transfer_in = Decimal::ZERO;
        next.period_transfer_out = Decimal::ZERO;
        next.version += 1;
        next.updated_at = now;
        next
    }

    /// Stages an activation change.
    pub(crate) fn with_active(&self, is_active: bool, now: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.is_active = is_active;
        next.version += 1;
        next.updated_at = now;
        next
    }
}
