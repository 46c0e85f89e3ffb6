//! Error type for database operations.

use kasa_core::{JournalError, LedgerError};
use sea_orm::DbErr;

/// Error types for ledger persistence.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// A stored row cannot be mapped back to a ledger value.
    #[error("Corrupt row in {table}: {message}")]
    Corrupt {
        /// Table the row came from.
        table: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// An update matched no row at the expected version.
    #[error("Stale write to {table} {id}: expected version {expected}")]
    Stale {
        /// Table being updated.
        table: &'static str,
        /// Row identifier.
        id: String,
        /// Version the row should have had before the write.
        expected: i64,
    },

    /// The engine rejected a restored book.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl DbError {
    pub(crate) fn corrupt(table: &'static str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            message: message.into(),
        }
    }
}

impl From<DbError> for JournalError {
    fn from(err: DbError) -> Self {
        Self(err.to_string())
    }
}
