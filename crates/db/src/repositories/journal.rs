//! Postgres implementation of the ledger journal.
//!
//! Each journal entry is written in a single database transaction. Account
//! rows are updated with an optimistic version check, so a second process
//! writing the same tenant fails loudly instead of overwriting.

use async_trait::async_trait;
use kasa_core::{CashAccount, JournalEntry, JournalError, LedgerJournal};
use kasa_shared::types::TenantId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{debug, error};

use super::error::DbError;
use super::mapping::{
    account_row, closing_line_rows, closing_row, posting_row, rate_row, to_db_time, transfer_row,
};
use crate::entities::{cash_accounts, closing_lines, exchange_rates, postings, tenants, transfers};

/// Journal that persists every committed ledger operation to Postgres.
#[derive(Debug, Clone)]
pub struct PgJournal {
    db: DatabaseConnection,
}

impl PgJournal {
    /// Creates a new journal.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Writes one entry inside a transaction.
    pub async fn write(&self, tenant_id: TenantId, entry: &JournalEntry) -> Result<(), DbError> {
        let txn = self.db.begin().await?;

        match entry {
            JournalEntry::TenantOpened {
                tenant_id,
                home_currency,
            } => {
                tenants::ActiveModel {
                    id: Set(tenant_id.into_inner()),
                    home_currency: Set(home_currency.as_str().to_string()),
                    created_at: Set(to_db_time(chrono::Utc::now())),
                }
                .insert(&txn)
                .await?;
            }
            JournalEntry::AccountOpened { account } => {
                account_row(account).insert(&txn).await?;
            }
            JournalEntry::AccountUpdated { account } => {
                update_account(&txn, account).await?;
            }
            JournalEntry::PostingRecorded { posting, account } => {
                posting_row(posting).insert(&txn).await?;
                update_account(&txn, account).await?;
            }
            JournalEntry::PostingReversed { posting, account } => {
                postings::ActiveModel {
                    id: Set(posting.id.into_inner()),
                    status: Set(posting.status.as_str().to_string()),
                    reversed_at: Set(posting.reversed_at.map(to_db_time)),
                    ..Default::default()
                }
                .update(&txn)
                .await?;
                update_account(&txn, account).await?;
            }
            JournalEntry::TransferRecorded {
                transfer,
                source,
                destination,
            } => {
                transfer_row(transfer).insert(&txn).await?;
                update_account(&txn, source).await?;
                update_account(&txn, destination).await?;
            }
            JournalEntry::TransferReversed {
                transfer,
                source,
                destination,
            } => {
                transfers::ActiveModel {
                    id: Set(transfer.id.into_inner()),
                    status: Set(transfer.status.as_str().to_string()),
                    reversed_at: Set(transfer.reversed_at.map(to_db_time)),
                    ..Default::default()
                }
                .update(&txn)
                .await?;
                update_account(&txn, source).await?;
                update_account(&txn, destination).await?;
            }
            JournalEntry::RateRecorded { rate } => {
                rate_row(tenant_id, rate)?.insert(&txn).await?;
            }
            JournalEntry::RateUpdated { rate } => {
                exchange_rates::ActiveModel {
                    id: Set(rate.id.into_inner()),
                    is_active: Set(rate.is_active),
                    ..Default::default()
                }
                .update(&txn)
                .await?;
            }
            JournalEntry::PeriodClosed { record, accounts } => {
                closing_row(record).insert(&txn).await?;
                let lines = closing_line_rows(record)?;
                if !lines.is_empty() {
                    closing_lines::Entity::insert_many(lines)
                        .exec_without_returning(&txn)
                        .await?;
                }
                for account in accounts {
                    update_account(&txn, account).await?;
                }
            }
        }

        txn.commit().await?;
        debug!(tenant_id = %tenant_id, entry = entry.kind(), "Journal entry written");
        Ok(())
    }
}

/// Writes the post-state of an account, expecting the stored row one version behind.
async fn update_account(txn: &DatabaseTransaction, account: &CashAccount) -> Result<(), DbError> {
    let expected = account.version - 1;
    let result = cash_accounts::Entity::update_many()
        .set(account_row(account))
        .filter(cash_accounts::Column::Id.eq(account.id.into_inner()))
        .filter(cash_accounts::Column::Version.eq(expected))
        .exec(txn)
        .await?;

    if result.rows_affected == 1 {
        Ok(())
    } else {
        Err(DbError::Stale {
            table: "cash_accounts",
            id: account.id.to_string(),
            expected,
        })
    }
}

#[async_trait]
impl LedgerJournal for PgJournal {
    async fn append(&self, tenant_id: TenantId, entry: &JournalEntry) -> Result<(), JournalError> {
        self.write(tenant_id, entry).await.map_err(|err| {
            error!(
                tenant_id = %tenant_id,
                entry = entry.kind(),
                error = %err,
                "Journal write failed"
            );
            JournalError::from(err)
        })
    }
}
