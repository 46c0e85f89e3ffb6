//! Repositories and the Postgres-backed ledger journal.

mod error;
mod journal;
mod ledger;
mod mapping;

pub use error::DbError;
pub use journal::PgJournal;
pub use ledger::LedgerRepository;
