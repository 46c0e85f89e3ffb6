//! Loads persisted tenant books back into the engine.

use std::collections::HashMap;

use kasa_core::{CashLedger, TenantSnapshot};
use kasa_shared::types::{Currency, TenantId};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::info;
use uuid::Uuid;

use super::error::DbError;
use super::mapping::{
    account_from_row, closing_from_rows, posting_from_row, rate_from_row, transfer_from_row,
};
use crate::entities::{
    cash_accounts, closing_lines, exchange_rates, period_closings, postings, tenants, transfers,
};

/// Repository for reading whole tenant books.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists every tenant with a persisted book, oldest first.
    pub async fn tenant_ids(&self) -> Result<Vec<TenantId>, DbError> {
        let rows = tenants::Entity::find()
            .order_by_asc(tenants::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|t| TenantId::from_uuid(t.id)).collect())
    }

    /// Reads one tenant's book. Returns `None` if the tenant was never opened.
    pub async fn load_tenant(&self, tenant_id: TenantId) -> Result<Option<TenantSnapshot>, DbError> {
        let id = tenant_id.into_inner();
        let Some(tenant) = tenants::Entity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        let home_currency = Currency::parse(&tenant.home_currency)
            .map_err(|e| DbError::corrupt("tenants", e.to_string()))?;

        let accounts = cash_accounts::Entity::find()
            .filter(cash_accounts::Column::TenantId.eq(id))
            .order_by_asc(cash_accounts::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(account_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let postings = postings::Entity::find()
            .filter(postings::Column::TenantId.eq(id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(posting_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let transfers = transfers::Entity::find()
            .filter(transfers::Column::TenantId.eq(id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(transfer_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let rates = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::TenantId.eq(id))
            .order_by_asc(exchange_rates::Column::Sequence)
            .all(&self.db)
            .await?
            .into_iter()
            .map(rate_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        let closings = self.load_closings(id).await?;

        Ok(Some(TenantSnapshot {
            tenant_id,
            home_currency,
            accounts,
            postings,
            transfers,
            rates,
            closings,
        }))
    }

    async fn load_closings(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<kasa_core::PeriodClosingRecord>, DbError> {
        let closings = period_closings::Entity::find()
            .filter(period_closings::Column::TenantId.eq(tenant_id))
            .order_by_asc(period_closings::Column::FiscalYear)
            .all(&self.db)
            .await?;
        if closings.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = closings.iter().map(|c| c.id).collect();
        let mut lines_by_closing: HashMap<Uuid, Vec<closing_lines::Model>> = HashMap::new();
        for line in closing_lines::Entity::find()
            .filter(closing_lines::Column::ClosingId.is_in(ids))
            .order_by_asc(closing_lines::Column::LineNo)
            .all(&self.db)
            .await?
        {
            lines_by_closing.entry(line.closing_id).or_default().push(line);
        }

        closings
            .into_iter()
            .map(|closing| {
                let lines = lines_by_closing.remove(&closing.id).unwrap_or_default();
                closing_from_rows(closing, lines)
            })
            .collect()
    }

    /// Loads every persisted tenant into `ledger`. Returns how many were restored.
    pub async fn restore_into(&self, ledger: &CashLedger) -> Result<usize, DbError> {
        let mut restored = 0;
        for tenant_id in self.tenant_ids().await? {
            if let Some(snapshot) = self.load_tenant(tenant_id).await? {
                ledger.restore(snapshot).await?;
                restored += 1;
            }
        }
        info!(tenants = restored, "Ledger restored from database");
        Ok(restored)
    }
}
