//! Durability boundary of the engine.
//!
//! Every committed mutation is handed to a [`LedgerJournal`] as one
//! [`JournalEntry`] carrying the post-state of every row it touched. The
//! engine applies the change in memory only after `append` succeeds.

use async_trait::async_trait;
use kasa_shared::types::{Currency, TenantId};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use thiserror::Error;

use super::account::CashAccount;
use super::error::LedgerError;
use super::posting::Posting;
use crate::closing::PeriodClosingRecord;
use crate::currency::ExchangeRate;
use crate::transfer::Transfer;

/// A journal write failed; nothing was applied.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct JournalError(pub String);

impl From<JournalError> for LedgerError {
    fn from(err: JournalError) -> Self {
        Self::Journal(err.0)
    }
}

/// One committed ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEntry {
    /// A tenant book was opened.
    TenantOpened {
        /// The tenant.
        tenant_id: TenantId,
        /// Home currency used for cross-rates.
        home_currency: Currency,
    },
    /// An account was created.
    AccountOpened {
        /// The new account row.
        account: CashAccount,
    },
    /// An account was activated or deactivated.
    AccountUpdated {
        /// The updated account row.
        account: CashAccount,
    },
    /// An income or expense was posted.
    PostingRecorded {
        /// The new posting.
        posting: Posting,
        /// The account after the posting.
        account: CashAccount,
    },
    /// A posting was reversed.
    PostingReversed {
        /// The posting, now reversed.
        posting: Posting,
        /// The account after the reversal.
        account: CashAccount,
    },
    /// A transfer was executed.
    TransferRecorded {
        /// The new transfer.
        transfer: Transfer,
        /// The source account after the debit.
        source: CashAccount,
        /// The destination account after the credit.
        destination: CashAccount,
    },
    /// A transfer was reversed.
    TransferReversed {
        /// The transfer, now reversed.
        transfer: Transfer,
        /// The source account after the reversal.
        source: CashAccount,
        /// The destination account after the reversal.
        destination: CashAccount,
    },
    /// A new exchange rate version was recorded.
    RateRecorded {
        /// The new version.
        rate: ExchangeRate,
    },
    /// An exchange rate version was deactivated.
    RateUpdated {
        /// The updated version.
        rate: ExchangeRate,
    },
    /// A fiscal year was closed.
    PeriodClosed {
        /// The closing record with its lines.
        record: PeriodClosingRecord,
        /// Every account after the rollover.
        accounts: Vec<CashAccount>,
    },
}

impl JournalEntry {
    /// Short name of the entry, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TenantOpened { .. } => "tenant_opened",
            Self::AccountOpened { .. } => "account_opened",
            Self::AccountUpdated { .. } => "account_updated",
            Self::PostingRecorded { .. } => "posting_recorded",
            Self::PostingReversed { .. } => "posting_reversed",
            Self::TransferRecorded { .. } => "transfer_recorded",
            Self::TransferReversed { .. } => "transfer_reversed",
            Self::RateRecorded { .. } => "rate_recorded",
            Self::RateUpdated { .. } => "rate_updated",
            Self::PeriodClosed { .. } => "period_closed",
        }
    }
}

/// Write-ahead sink for committed operations.
#[async_trait]
pub trait LedgerJournal: Send + Sync {
    /// Makes one entry durable. On error the engine discards the staged change.
    async fn append(&self, tenant_id: TenantId, entry: &JournalEntry) -> Result<(), JournalError>;
}

/// Journal that discards everything. The engine runs purely in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopJournal;

#[async_trait]
impl LedgerJournal for NoopJournal {
    async fn append(&self, _tenant_id: TenantId, _entry: &JournalEntry) -> Result<(), JournalError> {
        Ok(())
    }
}

/// Journal that keeps entries in memory, in append order.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<(TenantId, JournalEntry)>>,
}

impl MemoryJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all entries appended so far.
    #[must_use]
    pub fn entries(&self) -> Vec<(TenantId, JournalEntry)> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of entries appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.entries.lock() {
            Ok(entries) => entries.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Returns true if nothing has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LedgerJournal for MemoryJournal {
    async fn append(&self, tenant_id: TenantId, entry: &JournalEntry) -> Result<(), JournalError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| JournalError("memory journal poisoned".to_string()))?;
        entries.push((tenant_id, entry.clone()));
        Ok(())
    }
}

/// Journal that fails while switched off, and records otherwise.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FlakyJournal {
    failing: std::sync::atomic::AtomicBool,
    inner: MemoryJournal,
}

#[cfg(test)]
impl FlakyJournal {
    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
#[async_trait]
impl LedgerJournal for FlakyJournal {
    async fn append(&self, tenant_id: TenantId, entry: &JournalEntry) -> Result<(), JournalError> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(JournalError("disk full".to_string()));
        }
        self.inner.append(tenant_id, entry).await
    }
}
