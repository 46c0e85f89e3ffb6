//! Property-based tests for currency operations.
//!
//! - Banker's rounding always lands on the target currency's minor unit
//! - Resolution is deterministic and picks the latest version on or before the date
//! - Inverse and cross rates stay positive

use chrono::{Days, NaiveDate, Utc};
use kasa_shared::types::Currency;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::conversion::{convert_amount, convert_to};
use super::exchange::RateSource;
use super::table::RateTable;

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

fn target_currency() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::TRY),
        Just(Currency::USD),
        Just(Currency::JPY),
        Just(Currency::parse("KWD").unwrap()),
    ]
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

/// Versions as (day offset, rate) pairs.
fn versions() -> impl Strategy<Value = Vec<(u64, Decimal)>> {
    prop::collection::vec((0u64..365, positive_rate()), 1..20)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// *For any* amount and rate, the converted amount fits the target currency.
    #[test]
    fn prop_convert_fits_minor_unit(
        amount in positive_amount(),
        rate in positive_rate(),
        currency in target_currency(),
    ) {
        let converted = convert_to(amount, rate, currency).unwrap();
        prop_assert!(currency.accepts(converted) || converted.is_zero());
    }

    /// *For any* amount and rate, rounding moves the exact product by at most half a unit.
    #[test]
    fn prop_convert_error_bounded(
        amount in positive_amount(),
        rate in positive_rate(),
        places in 0u32..=4,
    ) {
        let exact = amount * rate;
        let rounded = convert_amount(amount, rate, places).unwrap();
        let half_unit = Decimal::new(5, places + 1);
        prop_assert!((exact - rounded).abs() <= half_unit);
    }

    /// *For any* version history, resolution returns the latest version on or before the date.
    #[test]
    fn prop_resolve_picks_latest_version(
        entries in versions(),
        query_offset in 0u64..400,
    ) {
        let mut table = RateTable::new();
        for (offset, rate) in &entries {
            let from = base_date() + Days::new(*offset);
            let staged = table.stage(Currency::USD, Currency::TRY, *rate, from, None, Utc::now());
            table.insert(staged);
        }
        let as_of = base_date() + Days::new(query_offset);

        // Last inserted wins among versions sharing the latest eligible date.
        let expected = entries
            .iter()
            .enumerate()
            .filter(|(_, (offset, _))| *offset <= query_offset)
            .max_by_key(|(idx, (offset, _))| (*offset, *idx))
            .map(|(_, (_, rate))| *rate);

        let first = table.resolve(Currency::USD, Currency::TRY, as_of, Currency::TRY, 10);
        let second = table.resolve(Currency::USD, Currency::TRY, as_of, Currency::TRY, 10);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first.map(|q| q.rate), expected);
        if let Some(quote) = first {
            prop_assert_eq!(quote.source, RateSource::Direct);
            prop_assert!(quote.effective_from <= as_of);
        }
    }

    /// *For any* pair of home-currency quotes, the cross rate is positive and uses
    /// the older leg's date.
    #[test]
    fn prop_cross_rate_positive(
        eur in positive_rate(),
        usd in positive_rate(),
        eur_offset in 0u64..100,
        usd_offset in 0u64..100,
    ) {
        let mut table = RateTable::new();
        let eur_from = base_date() + Days::new(eur_offset);
        let usd_from = base_date() + Days::new(usd_offset);
        let staged = table.stage(Currency::EUR, Currency::TRY, eur, eur_from, None, Utc::now());
        table.insert(staged);
        let staged = table.stage(Currency::USD, Currency::TRY, usd, usd_from, None, Utc::now());
        table.insert(staged);

        let as_of = base_date() + Days::new(200);
        if let Some(quote) = table.resolve(Currency::EUR, Currency::USD, as_of, Currency::TRY, 10) {
            prop_assert!(quote.rate > Decimal::ZERO);
            prop_assert_eq!(quote.source, RateSource::CrossRate);
            prop_assert_eq!(quote.effective_from, eur_from.min(usd_from));
        }
    }
}
