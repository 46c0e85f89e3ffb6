//! Currency conversion logic.
//!
//! CRITICAL: Rounding strategy for multi-currency:
//! - Always round to the destination currency's minor unit
//! - Use banker's rounding (round half to even)
//! - Store both original and converted amounts

use kasa_shared::types::Currency;
use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;

/// Converts an amount using the given exchange rate.
///
/// Uses banker's rounding (round half to even) to minimize cumulative errors.
/// Returns `None` if the product overflows.
#[must_use]
pub fn convert_amount(amount: Decimal, rate: Decimal, decimal_places: u32) -> Option<Decimal> {
    let converted = amount.checked_mul(rate)?;
    Some(converted.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven))
}

/// Converts an amount into `target`, rounded to its minor unit.
#[must_use]
pub fn convert_to(amount: Decimal, rate: Decimal, target: Currency) -> Option<Decimal> {
    convert_amount(amount, rate, target.minor_units())
}

/// Rounds a derived rate (inverse or cross) to `scale` fractional digits.
#[must_use]
pub fn round_rate(rate: Decimal, scale: u32) -> Decimal {
    rate.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven)
}
