//! Core business logic for Kasa.
//!
//! This crate contains the cash-ledger engine with ZERO web or database
//! dependencies. Persistence happens through the [`ledger::LedgerJournal`]
//! trait, implemented by the database crate.
//!
//! # Modules
//!
//! - `currency` - Versioned exchange rates, cross-rate resolution, rounding
//! - `ledger` - Cash accounts, income/expense postings, the engine itself
//! - `transfer` - Same- and cross-currency transfers between accounts
//! - `closing` - Year-end preview and irreversible period closing

pub mod closing;
pub mod currency;
pub mod ledger;
pub mod transfer;

pub use closing::{Accruals, ClosingLine, ClosingPreview, ClosingStatus, PeriodClosingRecord};
pub use currency::{ExchangeRate, RateHistory, RateQuote, RateSource};
pub use ledger::{
    AccountKind, CashAccount, CashLedger, Direction, ErrorKind, JournalEntry, JournalError,
    LedgerError, LedgerJournal, LedgerSettings, MemoryJournal, NoopJournal, Posting,
    PostingRequest, PostingStatus, TenantSnapshot,
};
pub use transfer::{Transfer, TransferRequest, TransferStatus};
