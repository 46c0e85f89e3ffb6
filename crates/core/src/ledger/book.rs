//! Per-tenant ledger state.

use dashmap::DashMap;
use kasa_shared::types::{CashAccountId, Currency, PostingId, TenantId, TransferId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::account::CashAccount;
use super::error::LedgerError;
use super::posting::Posting;
use crate::closing::PeriodClosingRecord;
use crate::currency::{ExchangeRate, RateTable};
use crate::transfer::Transfer;

/// Everything one tenant owns, as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSnapshot {
    /// The tenant.
    pub tenant_id: TenantId,
    /// Home currency used for cross-rates.
    pub home_currency: Currency,
    /// All accounts, active or not.
    pub accounts: Vec<CashAccount>,
    /// All postings, including reversed ones.
    pub postings: Vec<Posting>,
    /// All transfers, including reversed ones.
    pub transfers: Vec<Transfer>,
    /// All exchange rate versions, including inactive ones.
    pub rates: Vec<ExchangeRate>,
    /// Applied closings.
    pub closings: Vec<PeriodClosingRecord>,
}

/// In-memory book of one tenant.
///
/// Guarded by the tenant `RwLock`; each account sits behind its own mutex so
/// postings and transfers on different accounts proceed in parallel.
#[derive(Debug)]
pub(crate) struct TenantBook {
    pub(crate) tenant_id: TenantId,
    pub(crate) home_currency: Currency,
    pub(crate) accounts: BTreeMap<CashAccountId, Arc<Mutex<CashAccount>>>,
    pub(crate) postings: DashMap<PostingId, Posting>,
    pub(crate) transfers: DashMap<TransferId, Transfer>,
    pub(crate) rates: Mutex<RateTable>,
    pub(crate) closings: Vec<PeriodClosingRecord>,
    pub(crate) previewed: BTreeSet<i32>,
    pub(crate) closed_through: Option<i32>,
}

impl TenantBook {
    pub(crate) fn new(tenant_id: TenantId, home_currency: Currency) -> Self {
        Self {
            tenant_id,
            home_currency,
            accounts: BTreeMap::new(),
            postings: DashMap::new(),
            transfers: DashMap::new(),
            rates: Mutex::new(RateTable::new()),
            closings: Vec::new(),
            previewed: BTreeSet::new(),
            closed_through: None,
        }
    }

    pub(crate) fn from_snapshot(snapshot: TenantSnapshot) -> Self {
        let mut book = Self::new(snapshot.tenant_id, snapshot.home_currency);
        for account in snapshot.accounts {
            book.accounts.insert(account.id, Arc::new(Mutex::new(account)));
        }
        for posting in snapshot.postings {
            book.postings.insert(posting.id, posting);
        }
        for transfer in snapshot.transfers {
            book.transfers.insert(transfer.id, transfer);
        }
        book.rates = Mutex::new(RateTable::from_versions(snapshot.rates));
        book.closed_through = snapshot.closings.iter().map(|c| c.fiscal_year).max();
        book.closings = snapshot.closings;
        book.closings.sort_by_key(|c| c.fiscal_year);
        book
    }

    /// Copies the whole book. Callers hold the tenant write lock.
    pub(crate) async fn snapshot(&self) -> TenantSnapshot {
        let accounts = self.account_rows().await;
        let rates = {
            let table = self.rates.lock().await;
            table.versions().cloned().collect()
        };
        TenantSnapshot {
            tenant_id: self.tenant_id,
            home_currency: self.home_currency,
            accounts,
            postings: self.postings.iter().map(|p| p.value().clone()).collect(),
            transfers: self.transfers.iter().map(|t| t.value().clone()).collect(),
            rates,
            closings: self.closings.clone(),
        }
    }

    pub(crate) fn account(&self, id: CashAccountId) -> Result<Arc<Mutex<CashAccount>>, LedgerError> {
        self.accounts
            .get(&id)
            .cloned()
            .ok_or(LedgerError::AccountNotFound(id))
    }

    /// Current rows of every account, in id order.
    pub(crate) async fn account_rows(&self) -> Vec<CashAccount> {
        let mut rows = Vec::with_capacity(self.accounts.len());
        for account in self.accounts.values() {
            rows.push(account.lock().await.clone());
        }
        rows
    }

    pub(crate) fn posting(&self, id: PostingId) -> Result<Posting, LedgerError> {
        self.postings
            .get(&id)
            .map(|p| p.value().clone())
            .ok_or(LedgerError::PostingNotFound(id))
    }

    pub(crate) fn transfer(&self, id: TransferId) -> Result<Transfer, LedgerError> {
        self.transfers
            .get(&id)
            .map(|t| t.value().clone())
            .ok_or(LedgerError::TransferNotFound(id))
    }

    /// Fails with `AlreadyClosed` if `year` is at or before the latest closed year.
    pub(crate) fn ensure_not_closed(&self, year: i32) -> Result<(), LedgerError> {
        match self.closed_through {
            Some(closed) if year <= closed => Err(LedgerError::AlreadyClosed {
                tenant_id: self.tenant_id,
                year,
            }),
            _ => Ok(()),
        }
    }
}
