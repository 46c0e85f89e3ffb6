//! Transfer engine tests.

use chrono::NaiveDate;
use kasa_shared::types::{CashAccountId, Currency, PageRequest, TenantId, TransferId};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

use super::*;
use crate::currency::RateSource;
use crate::ledger::journal::FlakyJournal;
use crate::ledger::{
    AccountKind, CashAccount, CashLedger, Direction, LedgerError, LedgerSettings, PostingRequest,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn request(source: CashAccountId, destination: CashAccountId, amount: Decimal) -> TransferRequest {
    TransferRequest {
        source_account_id: source,
        destination_account_id: destination,
        amount,
        effective_date: date(2025, 3, 10),
        description: "Deposit cash to bank".to_string(),
        rate_override: None,
    }
}

async fn account(
    ledger: &CashLedger,
    tenant: TenantId,
    name: &str,
    currency: Currency,
    opening: Decimal,
) -> CashAccount {
    let account = ledger
        .create_account(tenant, name, currency, AccountKind::Bank)
        .await
        .unwrap();
    if opening > Decimal::ZERO {
        ledger
            .post(
                tenant,
                PostingRequest {
                    account_id: account.id,
                    direction: Direction::Income,
                    amount: opening,
                    effective_date: date(2025, 1, 2),
                    category: None,
                    description: "Opening deposit".to_string(),
                },
            )
            .await
            .unwrap();
    }
    ledger.get_account(tenant, account.id).await.unwrap()
}

async fn tenant(ledger: &CashLedger) -> TenantId {
    let tenant = TenantId::new();
    ledger.open_tenant(tenant, Some(Currency::TRY)).await.unwrap();
    tenant
}

#[tokio::test]
async fn test_credit_beyond_decimal_range_is_rejected() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let cash = account(&ledger, tenant, "Cash", Currency::TRY, dec!(10)).await;
    let bank = account(&ledger, tenant, "Bank", Currency::TRY, Decimal::MAX).await;

    let err = ledger
        .transfer(tenant, request(cash.id, bank.id, dec!(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AmountOverflow(id) if id == bank.id));

    assert_eq!(ledger.get_account(tenant, cash.id).await.unwrap(), cash);
    assert_eq!(ledger.get_account(tenant, bank.id).await.unwrap(), bank);
}

#[tokio::test]
async fn test_same_currency_transfer() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let cash = account(&ledger, tenant, "Cash", Currency::TRY, dec!(1000)).await;
    let bank = account(&ledger, tenant, "Bank", Currency::TRY, Decimal::ZERO).await;

    let transfer = ledger
        .transfer(tenant, request(cash.id, bank.id, dec!(400)))
        .await
        .unwrap();
    assert_eq!(transfer.rate, Decimal::ONE);
    assert_eq!(transfer.rate_source, RateSource::Identity);
    assert_eq!(transfer.destination_amount, dec!(400));
    assert!(!transfer.is_cross_currency());

    let cash = ledger.get_account(tenant, cash.id).await.unwrap();
    let bank = ledger.get_account(tenant, bank.id).await.unwrap();
    assert_eq!(cash.running_balance, dec!(600));
    assert_eq!(cash.period_transfer_out, dec!(400));
    assert_eq!(bank.running_balance, dec!(400));
    assert_eq!(bank.period_transfer_in, dec!(400));
    assert!(cash.is_balanced() && bank.is_balanced());
}

#[tokio::test]
async fn test_cross_currency_transfer_usd_to_try() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let usd = account(&ledger, tenant, "USD bank", Currency::USD, dec!(500)).await;
    let try_box = account(&ledger, tenant, "TRY cash", Currency::TRY, Decimal::ZERO).await;
    ledger
        .set_rate(tenant, Currency::USD, Currency::TRY, dec!(32.50), date(2025, 3, 1), None)
        .await
        .unwrap();

    let transfer = ledger
        .transfer(tenant, request(usd.id, try_box.id, dec!(100)))
        .await
        .unwrap();
    assert_eq!(transfer.rate, dec!(32.50));
    assert_eq!(transfer.rate_source, RateSource::Direct);
    assert_eq!(transfer.rate_effective_from, date(2025, 3, 1));
    assert_eq!(transfer.source_amount, dec!(100.00));
    assert_eq!(transfer.destination_amount, dec!(3250.00));

    let usd = ledger.get_account(tenant, usd.id).await.unwrap();
    let try_box = ledger.get_account(tenant, try_box.id).await.unwrap();
    assert_eq!(usd.running_balance, dec!(400));
    assert_eq!(try_box.running_balance, dec!(3250.00));
    assert_eq!(try_box.period_transfer_in, dec!(3250.00));
}

#[tokio::test]
async fn test_destination_rounding_is_half_even() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let usd = account(&ledger, tenant, "USD", Currency::USD, dec!(10)).await;
    let jpy = account(&ledger, tenant, "JPY", Currency::JPY, Decimal::ZERO).await;
    // 0.50 USD * 5 = 2.5 JPY -> 2
    ledger
        .set_rate(tenant, Currency::USD, Currency::JPY, dec!(5), date(2025, 1, 1), None)
        .await
        .unwrap();

    let transfer = ledger
        .transfer(tenant, request(usd.id, jpy.id, dec!(0.50)))
        .await
        .unwrap();
    assert_eq!(transfer.destination_amount, dec!(2));
}

#[tokio::test]
async fn test_transfer_rounding_to_zero_is_rejected() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let try_box = account(&ledger, tenant, "TRY", Currency::TRY, dec!(10)).await;
    let usd = account(&ledger, tenant, "USD", Currency::USD, Decimal::ZERO).await;
    ledger
        .set_rate(tenant, Currency::USD, Currency::TRY, dec!(32.50), date(2025, 1, 1), None)
        .await
        .unwrap();

    // 0.01 TRY / 32.50 = 0.0003 USD -> 0.00
    let result = ledger
        .transfer(tenant, request(try_box.id, usd.id, dec!(0.01)))
        .await;
    assert!(matches!(result, Err(LedgerError::InvalidAmount { .. })));
}

#[tokio::test]
async fn test_cross_rate_transfer_through_home_currency() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let eur = account(&ledger, tenant, "EUR", Currency::EUR, dec!(100)).await;
    let usd = account(&ledger, tenant, "USD", Currency::USD, Decimal::ZERO).await;
    ledger
        .set_rate(tenant, Currency::EUR, Currency::TRY, dec!(35), date(2025, 1, 1), None)
        .await
        .unwrap();
    ledger
        .set_rate(tenant, Currency::USD, Currency::TRY, dec!(32), date(2025, 2, 1), None)
        .await
        .unwrap();

    let transfer = ledger
        .transfer(tenant, request(eur.id, usd.id, dec!(10)))
        .await
        .unwrap();
    assert_eq!(transfer.rate_source, RateSource::CrossRate);
    assert_eq!(transfer.rate, dec!(1.09375));
    // 10 * 1.09375 = 10.9375 -> 10.94
    assert_eq!(transfer.destination_amount, dec!(10.94));
    assert_eq!(transfer.rate_effective_from, date(2025, 1, 1));
}

#[tokio::test]
async fn test_missing_rate_fails_without_side_effects() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let usd = account(&ledger, tenant, "USD", Currency::USD, dec!(100)).await;
    let eur = account(&ledger, tenant, "EUR", Currency::EUR, Decimal::ZERO).await;

    let result = ledger
        .transfer(tenant, request(usd.id, eur.id, dec!(10)))
        .await;
    assert!(matches!(result, Err(LedgerError::RateNotFound { .. })));
    assert_eq!(ledger.get_account(tenant, usd.id).await.unwrap(), usd);
    assert_eq!(ledger.get_account(tenant, eur.id).await.unwrap(), eur);
}

#[tokio::test]
async fn test_rate_override_is_recorded_verbatim() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let usd = account(&ledger, tenant, "USD", Currency::USD, dec!(100)).await;
    let try_box = account(&ledger, tenant, "TRY", Currency::TRY, Decimal::ZERO).await;

    let mut req = request(usd.id, try_box.id, dec!(10));
    req.rate_override = Some(dec!(33.1234));
    let transfer = ledger.transfer(tenant, req).await.unwrap();
    assert_eq!(transfer.rate, dec!(33.1234));
    assert_eq!(transfer.rate_source, RateSource::Override);
    // 331.234 -> 331.23
    assert_eq!(transfer.destination_amount, dec!(331.23));
}

#[rstest]
#[case(Some(dec!(0)), true)]
#[case(Some(dec!(-1)), true)]
#[case(Some(dec!(1.5)), false)]
#[tokio::test]
async fn test_invalid_overrides(#[case] rate_override: Option<Decimal>, #[case] cross: bool) {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let source = account(&ledger, tenant, "Source", Currency::USD, dec!(100)).await;
    let destination_currency = if cross { Currency::TRY } else { Currency::USD };
    let destination = account(&ledger, tenant, "Dest", destination_currency, Decimal::ZERO).await;

    let mut req = request(source.id, destination.id, dec!(10));
    req.rate_override = rate_override;
    let result = ledger.transfer(tenant, req).await;
    assert!(matches!(result, Err(LedgerError::InvalidRate(_))));
}

#[tokio::test]
async fn test_transfer_validation_errors() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let cash = account(&ledger, tenant, "Cash", Currency::TRY, dec!(100)).await;
    let bank = account(&ledger, tenant, "Bank", Currency::TRY, Decimal::ZERO).await;

    let same = ledger
        .transfer(tenant, request(cash.id, cash.id, dec!(10)))
        .await;
    assert!(matches!(same, Err(LedgerError::SameAccount(_))));

    let zero = ledger
        .transfer(tenant, request(cash.id, bank.id, dec!(0)))
        .await;
    assert!(matches!(zero, Err(LedgerError::InvalidAmount { .. })));

    let mut blank = request(cash.id, bank.id, dec!(1));
    blank.description = String::new();
    let blank = ledger.transfer(tenant, blank).await;
    assert!(matches!(blank, Err(LedgerError::EmptyDescription)));

    let unknown = ledger
        .transfer(tenant, request(cash.id, CashAccountId::new(), dec!(1)))
        .await;
    assert!(matches!(unknown, Err(LedgerError::AccountNotFound(_))));

    ledger
        .set_account_active(tenant, bank.id, false)
        .await
        .unwrap();
    let inactive = ledger
        .transfer(tenant, request(cash.id, bank.id, dec!(1)))
        .await;
    assert!(matches!(inactive, Err(LedgerError::AccountInactive(id)) if id == bank.id));

    assert_eq!(
        ledger.get_account(tenant, cash.id).await.unwrap().running_balance,
        dec!(100)
    );
}

#[tokio::test]
async fn test_reverse_transfer_uses_recorded_amounts() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let usd = account(&ledger, tenant, "USD", Currency::USD, dec!(500)).await;
    let try_box = account(&ledger, tenant, "TRY", Currency::TRY, Decimal::ZERO).await;
    ledger
        .set_rate(tenant, Currency::USD, Currency::TRY, dec!(32.50), date(2025, 3, 1), None)
        .await
        .unwrap();
    let transfer = ledger
        .transfer(tenant, request(usd.id, try_box.id, dec!(100)))
        .await
        .unwrap();

    // A later rate must not affect the reversal.
    ledger
        .set_rate(tenant, Currency::USD, Currency::TRY, dec!(40), date(2025, 3, 1), None)
        .await
        .unwrap();
    let reversed = ledger.reverse_transfer(tenant, transfer.id).await.unwrap();
    assert!(reversed.is_reversed());
    assert_eq!(reversed.destination_amount, dec!(3250.00));

    let usd_after = ledger.get_account(tenant, usd.id).await.unwrap();
    let try_after = ledger.get_account(tenant, try_box.id).await.unwrap();
    assert_eq!(usd_after.running_balance, dec!(500));
    assert_eq!(usd_after.period_transfer_out, Decimal::ZERO);
    assert_eq!(try_after.running_balance, Decimal::ZERO);
    assert_eq!(try_after.period_transfer_in, Decimal::ZERO);

    let again = ledger.reverse_transfer(tenant, transfer.id).await;
    assert!(matches!(again, Err(LedgerError::AlreadyReversed(_))));
    assert_eq!(ledger.get_account(tenant, usd.id).await.unwrap(), usd_after);

    let missing = ledger.reverse_transfer(tenant, TransferId::new()).await;
    assert!(matches!(missing, Err(LedgerError::TransferNotFound(_))));
}

#[tokio::test]
async fn test_journal_failure_applies_neither_leg() {
    let journal = Arc::new(FlakyJournal::default());
    let ledger = CashLedger::new(journal.clone(), LedgerSettings::default());
    let tenant = tenant(&ledger).await;
    let cash = account(&ledger, tenant, "Cash", Currency::TRY, dec!(100)).await;
    let bank = account(&ledger, tenant, "Bank", Currency::TRY, Decimal::ZERO).await;

    journal.set_failing(true);
    let result = ledger
        .transfer(tenant, request(cash.id, bank.id, dec!(60)))
        .await;
    assert!(matches!(result, Err(LedgerError::Journal(_))));

    assert_eq!(ledger.get_account(tenant, cash.id).await.unwrap(), cash);
    assert_eq!(ledger.get_account(tenant, bank.id).await.unwrap(), bank);
    let listed = ledger
        .list_transfers(tenant, None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(listed.meta.total, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposing_transfers_do_not_deadlock() {
    let ledger = Arc::new(CashLedger::in_memory());
    let tenant = tenant(&ledger).await;
    let a = account(&ledger, tenant, "A", Currency::TRY, dec!(10000)).await;
    let b = account(&ledger, tenant, "B", Currency::TRY, dec!(10000)).await;

    let mut handles = Vec::new();
    for i in 0..100 {
        let ledger = Arc::clone(&ledger);
        let (from, to) = if i % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
        handles.push(tokio::spawn(async move {
            ledger.transfer(tenant, request(from, to, dec!(1.25))).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let a = ledger.get_account(tenant, a.id).await.unwrap();
    let b = ledger.get_account(tenant, b.id).await.unwrap();
    assert_eq!(a.running_balance + b.running_balance, dec!(20000));
    assert_eq!(a.running_balance, dec!(10000));
    assert_eq!(a.period_transfer_out, dec!(62.50));
    assert_eq!(a.period_transfer_in, dec!(62.50));
    assert!(a.is_balanced() && b.is_balanced());
}

#[tokio::test]
async fn test_list_transfers_by_account() {
    let ledger = CashLedger::in_memory();
    let tenant = tenant(&ledger).await;
    let a = account(&ledger, tenant, "A", Currency::TRY, dec!(100)).await;
    let b = account(&ledger, tenant, "B", Currency::TRY, Decimal::ZERO).await;
    let c = account(&ledger, tenant, "C", Currency::TRY, Decimal::ZERO).await;

    ledger
        .transfer(tenant, request(a.id, b.id, dec!(10)))
        .await
        .unwrap();
    ledger
        .transfer(tenant, request(a.id, c.id, dec!(10)))
        .await
        .unwrap();

    let for_b = ledger
        .list_transfers(tenant, Some(b.id), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(for_b.meta.total, 1);
    assert!(for_b.data[0].involves(b.id));

    let for_a = ledger
        .list_transfers(tenant, Some(a.id), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(for_a.meta.total, 2);

    let fetched = ledger.get_transfer(tenant, for_b.data[0].id).await.unwrap();
    assert_eq!(fetched, for_b.data[0]);
}
