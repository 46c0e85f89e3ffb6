//! Transfer engine operations.

use chrono::Utc;
use kasa_shared::types::{CashAccountId, PageRequest, PageResponse, TenantId, TransferId};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, MutexGuard};
use tracing::info;

use super::types::{Transfer, TransferRequest, TransferStatus};
use crate::currency::{RateQuote, RateSource, convert_to};
use crate::ledger::journal::JournalEntry;
use crate::ledger::validation::{ensure_year_open, require_description, validate_amount, validate_rate};
use crate::ledger::{CashAccount, CashLedger, LedgerError};

/// Locks two accounts in id order, whatever their roles.
///
/// Returns the guards as `(source, destination)`.
pub(crate) async fn lock_pair<'a>(
    source_id: CashAccountId,
    source: &'a Mutex<CashAccount>,
    destination_id: CashAccountId,
    destination: &'a Mutex<CashAccount>,
) -> (MutexGuard<'a, CashAccount>, MutexGuard<'a, CashAccount>) {
    if source_id < destination_id {
        let source = source.lock().await;
        let destination = destination.lock().await;
        (source, destination)
    } else {
        let destination = destination.lock().await;
        let source = source.lock().await;
        (source, destination)
    }
}

impl CashLedger {
    /// Moves value between two accounts, converting when currencies differ.
    pub async fn transfer(
        &self,
        tenant_id: TenantId,
        request: TransferRequest,
    ) -> Result<Transfer, LedgerError> {
        let source_id = request.source_account_id;
        let destination_id = request.destination_account_id;
        if source_id == destination_id {
            return Err(LedgerError::SameAccount(source_id));
        }
        let description = require_description(&request.description)?;

        let book = self.book(tenant_id)?;
        let book = book.read().await;
        ensure_year_open(request.effective_date, book.closed_through)?;

        let source = book.account(source_id)?;
        let destination = book.account(destination_id)?;
        let (mut source, mut destination) =
            lock_pair(source_id, &source, destination_id, &destination).await;
        source.ensure_active()?;
        destination.ensure_active()?;
        validate_amount(request.amount, source.currency)?;

        let quote = if source.currency == destination.currency {
            if let Some(rate) = request.rate_override
                && rate != Decimal::ONE
            {
                return Err(LedgerError::InvalidRate(rate));
            }
            RateQuote::identity(source.currency, request.effective_date)
        } else if let Some(rate) = request.rate_override {
            validate_rate(rate)?;
            RateQuote {
                base: source.currency,
                quote: destination.currency,
                rate,
                source: RateSource::Override,
                effective_from: request.effective_date,
            }
        } else {
            let table = book.rates.lock().await;
            table
                .resolve(
                    source.currency,
                    destination.currency,
                    request.effective_date,
                    book.home_currency,
                    self.settings().derived_rate_scale,
                )
                .ok_or(LedgerError::RateNotFound {
                    base: source.currency,
                    quote: destination.currency,
                    date: request.effective_date,
                })?
        };

        let destination_amount = convert_to(request.amount, quote.rate, destination.currency)
            .ok_or(LedgerError::InvalidAmount {
                amount: request.amount,
                currency: source.currency,
            })?;
        if destination_amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount {
                amount: destination_amount,
                currency: destination.currency,
            });
        }

        let now = Utc::now();
        let transfer = Transfer {
            id: TransferId::new(),
            tenant_id,
            source_account_id: source_id,
            destination_account_id: destination_id,
            source_amount: request.amount,
            source_currency: source.currency,
            rate: quote.rate,
            rate_source: quote.source,
            rate_effective_from: quote.effective_from,
            destination_amount,
            destination_currency: destination.currency,
            effective_date: request.effective_date,
            description,
            status: TransferStatus::Completed,
            created_at: now,
            reversed_at: None,
        };
        let staged_source = source.apply_delta(transfer.debit(), now)?;
        let staged_destination = destination.apply_delta(transfer.credit(), now)?;

        self.commit(
            tenant_id,
            &JournalEntry::TransferRecorded {
                transfer: transfer.clone(),
                source: staged_source.clone(),
                destination: staged_destination.clone(),
            },
        )
        .await?;

        *source = staged_source;
        *destination = staged_destination;
        book.transfers.insert(transfer.id, transfer.clone());
        info!(
            tenant_id = %tenant_id,
            transfer_id = %transfer.id,
            source_account_id = %source_id,
            destination_account_id = %destination_id,
            source_amount = %transfer.source_amount,
            destination_amount = %transfer.destination_amount,
            rate = %transfer.rate,
            rate_source = %transfer.rate_source,
            "Transfer recorded"
        );
        Ok(transfer)
    }

    /// Compensates both legs of a transfer with the recorded amounts.
    pub async fn reverse_transfer(
        &self,
        tenant_id: TenantId,
        transfer_id: TransferId,
    ) -> Result<Transfer, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let recorded = book.transfer(transfer_id)?;
        let source_id = recorded.source_account_id;
        let destination_id = recorded.destination_account_id;

        let source = book.account(source_id)?;
        let destination = book.account(destination_id)?;
        let (mut source, mut destination) =
            lock_pair(source_id, &source, destination_id, &destination).await;

        // Re-read under the account locks: a concurrent reversal may have won.
        let transfer = book.transfer(transfer_id)?;
        if transfer.is_reversed() {
            return Err(LedgerError::AlreadyReversed(format!("Transfer {transfer_id}")));
        }
        ensure_year_open(transfer.effective_date, book.closed_through)?;

        let now = Utc::now();
        let staged_source = source.apply_delta(transfer.debit().negated(), now)?;
        let staged_destination = destination.apply_delta(transfer.credit().negated(), now)?;
        let reversed = transfer.reversed(now);

        self.commit(
            tenant_id,
            &JournalEntry::TransferReversed {
                transfer: reversed.clone(),
                source: staged_source.clone(),
                destination: staged_destination.clone(),
            },
        )
        .await?;

        *source = staged_source;
        *destination = staged_destination;
        book.transfers.insert(transfer_id, reversed.clone());
        info!(
            tenant_id = %tenant_id,
            transfer_id = %transfer_id,
            source_amount = %reversed.source_amount,
            destination_amount = %reversed.destination_amount,
            "Transfer reversed"
        );
        Ok(reversed)
    }

    /// Returns one transfer.
    pub async fn get_transfer(
        &self,
        tenant_id: TenantId,
        transfer_id: TransferId,
    ) -> Result<Transfer, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        book.transfer(transfer_id)
    }

    /// Lists transfers, newest effective date first, optionally touching one account.
    pub async fn list_transfers(
        &self,
        tenant_id: TenantId,
        account_id: Option<CashAccountId>,
        page: PageRequest,
    ) -> Result<PageResponse<Transfer>, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        if let Some(id) = account_id {
            book.account(id)?;
        }

        let mut transfers: Vec<Transfer> = book
            .transfers
            .iter()
            .filter(|t| account_id.is_none_or(|id| t.involves(id)))
            .map(|t| t.value().clone())
            .collect();
        transfers.sort_by(|a, b| {
            b.effective_date
                .cmp(&a.effective_date)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(page.paginate(transfers))
    }
}
