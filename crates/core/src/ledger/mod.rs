//! Cash accounts, income/expense postings and the engine itself.
//!
//! This module implements:
//! - Cash accounts and the single balance-mutation primitive
//! - Income and expense postings with compensating reversal
//! - The per-tenant book and the journal it writes through
//! - Error types for every ledger operation

pub mod account;
pub mod book;
pub mod error;
pub mod journal;
pub mod posting;
pub mod service;
pub mod validation;

#[cfg(test)]
mod service_props;

pub use account::{AccountDelta, AccountKind, CashAccount, PeriodAggregate};
pub use book::TenantSnapshot;
pub use error::{ErrorKind, LedgerError};
pub use journal::{JournalEntry, JournalError, LedgerJournal, MemoryJournal, NoopJournal};
pub use posting::{Direction, Posting, PostingRequest, PostingStatus};
pub use service::{CashLedger, LedgerSettings};
