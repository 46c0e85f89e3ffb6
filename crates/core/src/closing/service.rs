//! Period-closing operations on the engine.
//!
//! Preview and apply both hold the tenant write lock, so they see one
//! consistent set of account rows and no posting or transfer can interleave.

use chrono::Utc;
use kasa_shared::types::{ClosingId, TenantId};
use tracing::{info, warn};

use super::engine::compute_closing_lines;
use super::types::{Accruals, ClosingLine, ClosingPreview, ClosingStatus, PeriodClosingRecord};
use crate::ledger::book::TenantBook;
use crate::ledger::journal::JournalEntry;
use crate::ledger::validation::require_description;
use crate::ledger::{CashLedger, LedgerError};

/// Checks the accruals and computes the lines from the current account rows.
async fn compute(book: &TenantBook, accruals: &Accruals) -> Result<Vec<ClosingLine>, LedgerError> {
    let accounts = book.account_rows().await;
    for account_id in accruals.accounts() {
        let account = accounts
            .iter()
            .find(|a| a.id == account_id)
            .ok_or(LedgerError::AccountNotFound(account_id))?;
        let amount = accruals.get(account_id);
        if !account.currency.accepts(amount) {
            return Err(LedgerError::InvalidAmount {
                amount,
                currency: account.currency,
            });
        }
    }

    compute_closing_lines(&accounts, accruals).inspect_err(|e| {
        if let LedgerError::BalanceDrift {
            account_id,
            running_balance,
            physical_balance,
        } = e
        {
            warn!(
                tenant_id = %book.tenant_id,
                account_id = %account_id,
                running_balance = %running_balance,
                physical_balance = %physical_balance,
                "Balance drift detected, closing aborted"
            );
        }
    })
}

impl CashLedger {
    /// Computes the year-end rollover without changing anything.
    pub async fn preview_closing(
        &self,
        tenant_id: TenantId,
        fiscal_year: i32,
        accruals: &Accruals,
    ) -> Result<ClosingPreview, LedgerError> {
        let book = self.book(tenant_id)?;
        let mut book = book.write().await;
        book.ensure_not_closed(fiscal_year)?;

        let lines = compute(&book, accruals).await?;
        book.previewed.insert(fiscal_year);
        info!(
            tenant_id = %tenant_id,
            fiscal_year,
            accounts = lines.len(),
            "Closing previewed"
        );
        Ok(ClosingPreview {
            tenant_id,
            fiscal_year,
            lines,
            generated_at: Utc::now(),
        })
    }

    /// Closes a fiscal year: every included account gets its new
    /// carry-forward and zeroed aggregates. Irreversible.
    pub async fn apply_closing(
        &self,
        tenant_id: TenantId,
        fiscal_year: i32,
        accruals: &Accruals,
        description: &str,
    ) -> Result<PeriodClosingRecord, LedgerError> {
        let description = require_description(description)?;
        let book = self.book(tenant_id)?;
        let mut book = book.write().await;
        book.ensure_not_closed(fiscal_year)?;

        let lines = compute(&book, accruals).await?;
        let now = Utc::now();

        let mut staged = Vec::with_capacity(lines.len());
        for line in &lines {
            let account = book.account(line.account_id)?;
            let account = account.lock().await;
            staged.push(account.roll_forward(line.new_carry_forward, now));
        }

        let record = PeriodClosingRecord {
            id: ClosingId::new(),
            tenant_id,
            fiscal_year,
            description,
            lines,
            applied_at: now,
        };
        self.commit(
            tenant_id,
            &JournalEntry::PeriodClosed {
                record: record.clone(),
                accounts: staged.clone(),
            },
        )
        .await?;

        for row in staged {
            let account = book.account(row.id)?;
            *account.lock().await = row;
        }
        book.closings.push(record.clone());
        book.closed_through = Some(book.closed_through.map_or(fiscal_year, |y| y.max(fiscal_year)));
        book.previewed.remove(&fiscal_year);
        info!(
            tenant_id = %tenant_id,
            fiscal_year,
            closing_id = %record.id,
            accounts = record.lines.len(),
            "Fiscal year closed"
        );
        Ok(record)
    }

    /// Status of a tenant-year.
    ///
    /// Years at or before the latest closed year report `Applied`: they can
    /// no longer be posted to or closed.
    pub async fn closing_status(
        &self,
        tenant_id: TenantId,
        fiscal_year: i32,
    ) -> Result<ClosingStatus, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        if book.closed_through.is_some_and(|y| fiscal_year <= y) {
            return Ok(ClosingStatus::Applied);
        }
        if book.previewed.contains(&fiscal_year) {
            return Ok(ClosingStatus::Previewed);
        }
        Ok(ClosingStatus::Open)
    }

    /// All applied closings, oldest year first.
    pub async fn closing_records(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<PeriodClosingRecord>, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        Ok(book.closings.clone())
    }
}
