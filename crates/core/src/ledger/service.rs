//! The cash-ledger engine: tenants, accounts and postings.
//!
//! Every mutation is staged on copies, handed to the [`LedgerJournal`] and
//! only applied in memory once the journal accepted it. Rate, transfer and
//! closing operations live next to their types and extend [`CashLedger`].

use chrono::Utc;
use dashmap::DashMap;
use kasa_shared::config::LedgerConfig;
use kasa_shared::types::{
    CashAccountId, Currency, PageRequest, PageResponse, PostingId, TenantId,
};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use super::account::{AccountKind, CashAccount};
use super::book::{TenantBook, TenantSnapshot};
use super::error::LedgerError;
use super::journal::{JournalEntry, LedgerJournal, NoopJournal};
use super::posting::{Posting, PostingRequest, PostingStatus};
use super::validation::{
    ensure_year_open, optional_text, require_description, require_name, validate_amount,
};

/// Engine-wide settings.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// Home currency of tenants opened without one.
    pub default_home_currency: Currency,
    /// Fractional digits kept on inverse and cross rates.
    pub derived_rate_scale: u32,
    /// History length when the caller passes no limit.
    pub default_history_limit: usize,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            default_home_currency: Currency::TRY,
            derived_rate_scale: 10,
            default_history_limit: 50,
        }
    }
}

impl LedgerSettings {
    /// Builds settings from the `ledger` configuration section.
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let default_home_currency = Currency::parse(&config.default_home_currency)
            .map_err(|e| LedgerError::InvalidCurrency(e.0))?;
        Ok(Self {
            default_home_currency,
            derived_rate_scale: config.derived_rate_scale.min(28),
            default_history_limit: config.default_history_limit,
        })
    }
}

/// Multi-tenant cash ledger.
pub struct CashLedger {
    tenants: DashMap<TenantId, Arc<RwLock<TenantBook>>>,
    opening: Mutex<()>,
    journal: Arc<dyn LedgerJournal>,
    settings: LedgerSettings,
}

impl std::fmt::Debug for CashLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CashLedger")
            .field("tenants", &self.tenants.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CashLedger {
    /// Creates an engine writing through `journal`.
    #[must_use]
    pub fn new(journal: Arc<dyn LedgerJournal>, settings: LedgerSettings) -> Self {
        Self {
            tenants: DashMap::new(),
            opening: Mutex::new(()),
            journal,
            settings,
        }
    }

    /// Creates an engine without durability, for tests and tooling.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(NoopJournal), LedgerSettings::default())
    }

    /// Engine settings.
    #[must_use]
    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    pub(crate) fn book(&self, tenant_id: TenantId) -> Result<Arc<RwLock<TenantBook>>, LedgerError> {
        self.tenants
            .get(&tenant_id)
            .map(|b| Arc::clone(b.value()))
            .ok_or(LedgerError::TenantNotFound(tenant_id))
    }

    /// Makes an entry durable. Nothing may be applied if this fails.
    pub(crate) async fn commit(
        &self,
        tenant_id: TenantId,
        entry: &JournalEntry,
    ) -> Result<(), LedgerError> {
        self.journal.append(tenant_id, entry).await.map_err(|e| {
            warn!(
                tenant_id = %tenant_id,
                entry = entry.kind(),
                error = %e,
                "Journal append failed, operation discarded"
            );
            LedgerError::from(e)
        })
    }

    // ========== Tenants ==========

    /// Opens an empty book for a tenant.
    pub async fn open_tenant(
        &self,
        tenant_id: TenantId,
        home_currency: Option<Currency>,
    ) -> Result<(), LedgerError> {
        let _opening = self.opening.lock().await;
        if self.tenants.contains_key(&tenant_id) {
            return Err(LedgerError::TenantAlreadyOpen(tenant_id));
        }

        let home_currency = home_currency.unwrap_or(self.settings.default_home_currency);
        self.commit(
            tenant_id,
            &JournalEntry::TenantOpened {
                tenant_id,
                home_currency,
            },
        )
        .await?;

        self.tenants.insert(
            tenant_id,
            Arc::new(RwLock::new(TenantBook::new(tenant_id, home_currency))),
        );
        info!(tenant_id = %tenant_id, home_currency = %home_currency, "Tenant opened");
        Ok(())
    }

    /// Reinstates a tenant book loaded from storage.
    ///
    /// The snapshot is taken as is; inconsistencies surface as `BalanceDrift`
    /// on the next mutation or closing.
    pub async fn restore(&self, snapshot: TenantSnapshot) -> Result<(), LedgerError> {
        let _opening = self.opening.lock().await;
        let tenant_id = snapshot.tenant_id;
        if self.tenants.contains_key(&tenant_id) {
            return Err(LedgerError::TenantAlreadyOpen(tenant_id));
        }

        let accounts = snapshot.accounts.len();
        let postings = snapshot.postings.len();
        let transfers = snapshot.transfers.len();
        self.tenants.insert(
            tenant_id,
            Arc::new(RwLock::new(TenantBook::from_snapshot(snapshot))),
        );
        info!(
            tenant_id = %tenant_id,
            accounts,
            postings,
            transfers,
            "Tenant restored"
        );
        Ok(())
    }

    /// Copies a tenant's whole book.
    pub async fn snapshot(&self, tenant_id: TenantId) -> Result<TenantSnapshot, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.write().await;
        Ok(book.snapshot().await)
    }

    /// Home currency of a tenant.
    pub async fn home_currency(&self, tenant_id: TenantId) -> Result<Currency, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        Ok(book.home_currency)
    }

    // ========== Accounts ==========

    /// Creates an active account with zero balances.
    pub async fn create_account(
        &self,
        tenant_id: TenantId,
        name: &str,
        currency: Currency,
        kind: AccountKind,
    ) -> Result<CashAccount, LedgerError> {
        let name = require_name(name)?;
        let book = self.book(tenant_id)?;
        let mut book = book.write().await;

        let account = CashAccount::new(tenant_id, name, currency, kind, Utc::now());
        self.commit(
            tenant_id,
            &JournalEntry::AccountOpened {
                account: account.clone(),
            },
        )
        .await?;

        book.accounts
            .insert(account.id, Arc::new(Mutex::new(account.clone())));
        info!(
            tenant_id = %tenant_id,
            account_id = %account.id,
            currency = %currency,
            kind = %kind,
            "Account created"
        );
        Ok(account)
    }

    /// Returns one account.
    pub async fn get_account(
        &self,
        tenant_id: TenantId,
        account_id: CashAccountId,
    ) -> Result<CashAccount, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let account = book.account(account_id)?;
        let account = account.lock().await;
        Ok(account.clone())
    }

    /// Returns every account of a tenant, oldest first.
    pub async fn list_accounts(&self, tenant_id: TenantId) -> Result<Vec<CashAccount>, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let mut rows = book.account_rows().await;
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(rows)
    }

    /// Deactivates or reactivates an account. Accounts are never deleted.
    pub async fn set_account_active(
        &self,
        tenant_id: TenantId,
        account_id: CashAccountId,
        active: bool,
    ) -> Result<CashAccount, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let account = book.account(account_id)?;
        let mut account = account.lock().await;
        if account.is_active == active {
            return Ok(account.clone());
        }

        let staged = account.with_active(active, Utc::now());
        self.commit(
            tenant_id,
            &JournalEntry::AccountUpdated {
                account: staged.clone(),
            },
        )
        .await?;

        *account = staged.clone();
        info!(
            tenant_id = %tenant_id,
            account_id = %account_id,
            active,
            "Account activation changed"
        );
        Ok(staged)
    }

    // ========== Postings ==========

    /// Records an income or expense against one account.
    pub async fn post(
        &self,
        tenant_id: TenantId,
        request: PostingRequest,
    ) -> Result<Posting, LedgerError> {
        let description = require_description(&request.description)?;
        let category = optional_text(request.category.as_deref());

        let book = self.book(tenant_id)?;
        let book = book.read().await;
        ensure_year_open(request.effective_date, book.closed_through)?;

        let account = book.account(request.account_id)?;
        let mut account = account.lock().await;
        account.ensure_active()?;
        validate_amount(request.amount, account.currency)?;

        let now = Utc::now();
        let staged = account.apply_delta(request.direction.delta(request.amount), now)?;
        let posting = Posting {
            id: PostingId::new(),
            tenant_id,
            account_id: account.id,
            direction: request.direction,
            amount: request.amount,
            currency: account.currency,
            effective_date: request.effective_date,
            category,
            description,
            status: PostingStatus::Posted,
            created_at: now,
            reversed_at: None,
        };

        self.commit(
            tenant_id,
            &JournalEntry::PostingRecorded {
                posting: posting.clone(),
                account: staged.clone(),
            },
        )
        .await?;

        *account = staged;
        book.postings.insert(posting.id, posting.clone());
        info!(
            tenant_id = %tenant_id,
            posting_id = %posting.id,
            account_id = %posting.account_id,
            direction = %posting.direction,
            amount = %posting.amount,
            "Posting recorded"
        );
        Ok(posting)
    }

    /// Compensates a posting and marks it reversed.
    pub async fn reverse_posting(
        &self,
        tenant_id: TenantId,
        posting_id: PostingId,
    ) -> Result<Posting, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let account_id = book.posting(posting_id)?.account_id;

        let account = book.account(account_id)?;
        let mut account = account.lock().await;

        // Re-read under the account lock: a concurrent reversal may have won.
        let posting = book.posting(posting_id)?;
        if posting.is_reversed() {
            return Err(LedgerError::AlreadyReversed(format!("Posting {posting_id}")));
        }
        ensure_year_open(posting.effective_date, book.closed_through)?;

        let now = Utc::now();
        let staged = account.apply_delta(posting.delta().negated(), now)?;
        let reversed = posting.reversed(now);

        self.commit(
            tenant_id,
            &JournalEntry::PostingReversed {
                posting: reversed.clone(),
                account: staged.clone(),
            },
        )
        .await?;

        *account = staged;
        book.postings.insert(posting_id, reversed.clone());
        info!(
            tenant_id = %tenant_id,
            posting_id = %posting_id,
            account_id = %account_id,
            amount = %reversed.amount,
            "Posting reversed"
        );
        Ok(reversed)
    }

    /// Returns one posting.
    pub async fn get_posting(
        &self,
        tenant_id: TenantId,
        posting_id: PostingId,
    ) -> Result<Posting, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        book.posting(posting_id)
    }

    /// Lists postings, newest effective date first, optionally for one account.
    pub async fn list_postings(
        &self,
        tenant_id: TenantId,
        account_id: Option<CashAccountId>,
        page: PageRequest,
    ) -> Result<PageResponse<Posting>, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        if let Some(id) = account_id {
            book.account(id)?;
        }

        let mut postings: Vec<Posting> = book
            .postings
            .iter()
            .filter(|p| account_id.is_none_or(|id| p.account_id == id))
            .map(|p| p.value().clone())
            .collect();
        postings.sort_by(|a, b| {
            b.effective_date
                .cmp(&a.effective_date)
                .then(b.created_at.cmp(&a.created_at))
                .then(b.id.cmp(&a.id))
        });
        Ok(page.paginate(postings))
    }
}
