//! Exchange-rate registry operations on the engine.

use chrono::{NaiveDate, Utc};
use kasa_shared::types::{Currency, RateId, TenantId};
use rust_decimal::Decimal;
use tracing::info;

use super::exchange::{ExchangeRate, RateQuote};
use super::table::RateHistory;
use crate::ledger::journal::JournalEntry;
use crate::ledger::validation::{optional_text, validate_rate};
use crate::ledger::{CashLedger, LedgerError};

impl CashLedger {
    /// Records a new rate version. Prior versions are kept.
    pub async fn set_rate(
        &self,
        tenant_id: TenantId,
        base: Currency,
        quote: Currency,
        rate: Decimal,
        effective_from: NaiveDate,
        note: Option<&str>,
    ) -> Result<ExchangeRate, LedgerError> {
        validate_rate(rate)?;
        if base == quote {
            return Err(LedgerError::InvalidRate(rate));
        }

        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let mut table = book.rates.lock().await;

        let version = table.stage(
            base,
            quote,
            rate,
            effective_from,
            optional_text(note),
            Utc::now(),
        );
        self.commit(
            tenant_id,
            &JournalEntry::RateRecorded {
                rate: version.clone(),
            },
        )
        .await?;

        table.insert(version.clone());
        info!(
            tenant_id = %tenant_id,
            base = %base,
            quote = %quote,
            rate = %rate,
            effective_from = %effective_from,
            "Exchange rate recorded"
        );
        Ok(version)
    }

    /// Withdraws a version from resolution. It stays in the history.
    pub async fn deactivate_rate(
        &self,
        tenant_id: TenantId,
        rate_id: RateId,
    ) -> Result<ExchangeRate, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let mut table = book.rates.lock().await;

        let current = table
            .get(rate_id)
            .cloned()
            .ok_or(LedgerError::RateVersionNotFound(rate_id))?;
        if !current.is_active {
            return Ok(current);
        }

        let updated = ExchangeRate {
            is_active: false,
            ..current
        };
        self.commit(
            tenant_id,
            &JournalEntry::RateUpdated {
                rate: updated.clone(),
            },
        )
        .await?;

        table.replace(updated.clone());
        info!(tenant_id = %tenant_id, rate_id = %rate_id, "Exchange rate deactivated");
        Ok(updated)
    }

    /// Resolves `1 base = ? quote` as of a date.
    pub async fn resolve_rate(
        &self,
        tenant_id: TenantId,
        base: Currency,
        quote: Currency,
        as_of: NaiveDate,
    ) -> Result<RateQuote, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let table = book.rates.lock().await;
        table
            .resolve(
                base,
                quote,
                as_of,
                book.home_currency,
                self.settings().derived_rate_scale,
            )
            .ok_or(LedgerError::RateNotFound {
                base,
                quote,
                date: as_of,
            })
    }

    /// Versions of a pair, newest first. `None` uses the configured limit.
    pub async fn rate_history(
        &self,
        tenant_id: TenantId,
        base: Currency,
        quote: Currency,
        limit: Option<usize>,
    ) -> Result<RateHistory, LedgerError> {
        let book = self.book(tenant_id)?;
        let book = book.read().await;
        let table = book.rates.lock().await;
        let limit = limit.unwrap_or(self.settings().default_history_limit);
        Ok(RateHistory::new(table.history(base, quote), limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::RateSource;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn ledger() -> (CashLedger, TenantId) {
        let ledger = CashLedger::in_memory();
        let tenant = TenantId::new();
        ledger.open_tenant(tenant, Some(Currency::TRY)).await.unwrap();
        (ledger, tenant)
    }

    #[tokio::test]
    async fn test_set_rate_rejects_non_positive() {
        let (ledger, tenant) = ledger().await;
        let result = ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(0), date(2025, 1, 1), None)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidRate(_))));

        let result = ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(-3), date(2025, 1, 1), None)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidRate(_))));
    }

    #[tokio::test]
    async fn test_set_rate_rejects_same_currency() {
        let (ledger, tenant) = ledger().await;
        let result = ledger
            .set_rate(tenant, Currency::USD, Currency::USD, dec!(1), date(2025, 1, 1), None)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidRate(_))));
    }

    #[tokio::test]
    async fn test_versions_are_not_overwritten() {
        let (ledger, tenant) = ledger().await;
        ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(30), date(2025, 1, 1), Some("bank"))
            .await
            .unwrap();
        ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(32.50), date(2025, 1, 1), None)
            .await
            .unwrap();

        let history = ledger
            .rate_history(tenant, Currency::USD, Currency::TRY, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        let rates: Vec<Decimal> = history.iter().map(|r| r.rate).collect();
        assert_eq!(rates, vec![dec!(32.50), dec!(30)]);
        assert_eq!(history.iter().nth(1).unwrap().note.as_deref(), Some("bank"));
    }

    #[tokio::test]
    async fn test_resolve_direct_inverse_and_cross() {
        let (ledger, tenant) = ledger().await;
        ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(32.50), date(2025, 1, 1), None)
            .await
            .unwrap();
        ledger
            .set_rate(tenant, Currency::EUR, Currency::TRY, dec!(35.75), date(2025, 1, 2), None)
            .await
            .unwrap();

        let direct = ledger
            .resolve_rate(tenant, Currency::USD, Currency::TRY, date(2025, 1, 15))
            .await
            .unwrap();
        assert_eq!(direct.rate, dec!(32.50));
        assert_eq!(direct.source, RateSource::Direct);

        let inverse = ledger
            .resolve_rate(tenant, Currency::TRY, Currency::USD, date(2025, 1, 15))
            .await
            .unwrap();
        assert_eq!(inverse.source, RateSource::Inverse);
        assert_eq!(inverse.rate, dec!(0.0307692308));

        // 35.75 / 32.50 = 1.1
        let cross = ledger
            .resolve_rate(tenant, Currency::EUR, Currency::USD, date(2025, 1, 15))
            .await
            .unwrap();
        assert_eq!(cross.source, RateSource::CrossRate);
        assert_eq!(cross.rate, dec!(1.1));
        assert_eq!(cross.effective_from, date(2025, 1, 1));
    }

    #[tokio::test]
    async fn test_resolve_before_first_version_fails() {
        let (ledger, tenant) = ledger().await;
        ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(32.50), date(2025, 3, 1), None)
            .await
            .unwrap();
        let result = ledger
            .resolve_rate(tenant, Currency::USD, Currency::TRY, date(2025, 2, 28))
            .await;
        assert!(matches!(result, Err(LedgerError::RateNotFound { .. })));
    }

    #[tokio::test]
    async fn test_deactivate_rate_hides_version_from_resolution() {
        let (ledger, tenant) = ledger().await;
        ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(30), date(2025, 1, 1), None)
            .await
            .unwrap();
        let typo = ledger
            .set_rate(tenant, Currency::USD, Currency::TRY, dec!(320), date(2025, 2, 1), None)
            .await
            .unwrap();

        let updated = ledger.deactivate_rate(tenant, typo.id).await.unwrap();
        assert!(!updated.is_active);

        let quote = ledger
            .resolve_rate(tenant, Currency::USD, Currency::TRY, date(2025, 2, 10))
            .await
            .unwrap();
        assert_eq!(quote.rate, dec!(30));

        let history = ledger
            .rate_history(tenant, Currency::USD, Currency::TRY, Some(10))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);

        let missing = ledger.deactivate_rate(tenant, RateId::new()).await;
        assert!(matches!(missing, Err(LedgerError::RateVersionNotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_tenant() {
        let ledger = CashLedger::in_memory();
        let result = ledger
            .resolve_rate(TenantId::new(), Currency::USD, Currency::TRY, date(2025, 1, 1))
            .await;
        assert!(matches!(result, Err(LedgerError::TenantNotFound(_))));
    }
}
