//! Income and expense postings.

use chrono::{DateTime, NaiveDate, Utc};
use kasa_shared::types::{CashAccountId, Currency, PostingId, TenantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::account::AccountDelta;

/// Direction of a posting, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Money received into the register.
    Income,
    /// Money paid out of the register.
    Expense,
}

impl Direction {
    /// Returns the string representation of the direction.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Parses a direction from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// The account delta a posting of `amount` in this direction applies.
    #[must_use]
    pub fn delta(self, amount: Decimal) -> AccountDelta {
        match self {
            Self::Income => AccountDelta::income(amount),
            Self::Expense => AccountDelta::expense(amount),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostingStatus {
    /// In effect.
    Posted,
    /// Compensated; kept for audit.
    Reversed,
}

impl PostingStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Posted => "posted",
            Self::Reversed => "reversed",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "posted" => Some(Self::Posted),
            "reversed" => Some(Self::Reversed),
            _ => None,
        }
    }
}

/// Input for recording a posting.
#[derive(Debug, Clone)]
pub struct PostingRequest {
    /// Target account.
    pub account_id: CashAccountId,
    /// Income or expense.
    pub direction: Direction,
    /// Positive amount in the account's currency.
    pub amount: Decimal,
    /// Effective (value) date.
    pub effective_date: NaiveDate,
    /// Optional category, e.g. "dues" or "rent".
    pub category: Option<String>,
    /// Free-text description.
    pub description: String,
}

/// An immutable income or expense entry against one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Unique identifier.
    pub id: PostingId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// The account posted to.
    pub account_id: CashAccountId,
    /// Income or expense.
    pub direction: Direction,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency of the account at posting time.
    pub currency: Currency,
    /// Effective (value) date.
    pub effective_date: NaiveDate,
    /// Optional category.
    pub category: Option<String>,
    /// Free-text description.
    pub description: String,
    /// Posted or reversed.
    pub status: PostingStatus,
    /// When the posting was recorded.
    pub created_at: DateTime<Utc>,
    /// When the posting was reversed, if it was.
    pub reversed_at: Option<DateTime<Utc>>,
}

impl Posting {
    /// Returns true if the posting has been reversed.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.status == PostingStatus::Reversed
    }

    /// The delta this posting applied to its account.
    #[must_use]
    pub fn delta(&self) -> AccountDelta {
        self.direction.delta(self.amount)
    }

    /// Returns the reversed copy of this posting.
    #[must_use]
    pub fn reversed(&self, now: DateTime<Utc>) -> Self {
        Self {
            status: PostingStatus::Reversed,
            reversed_at: Some(now),
            ..self.clone()
        }
    }
}
