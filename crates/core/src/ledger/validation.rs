//! Input validation shared by postings, transfers, rates and closing.

use chrono::{Datelike, NaiveDate};
use kasa_shared::types::Currency;
use rust_decimal::Decimal;

use super::error::LedgerError;

/// Rejects non-positive amounts regardless of currency.
pub fn validate_positive(amount: Decimal, currency: Currency) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount { amount, currency });
    }
    Ok(())
}

/// Rejects amounts that are not positive or need more decimals than the
/// currency's minor unit.
pub fn validate_amount(amount: Decimal, currency: Currency) -> Result<(), LedgerError> {
    validate_positive(amount, currency)?;
    if !currency.accepts(amount) {
        return Err(LedgerError::InvalidAmount { amount, currency });
    }
    Ok(())
}

/// Rejects non-positive exchange rates.
pub fn validate_rate(rate: Decimal) -> Result<(), LedgerError> {
    if rate <= Decimal::ZERO {
        return Err(LedgerError::InvalidRate(rate));
    }
    Ok(())
}

/// Trims a required description.
pub fn require_description(description: &str) -> Result<String, LedgerError> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyDescription);
    }
    Ok(trimmed.to_string())
}

/// Trims a required account name.
pub fn require_name(name: &str) -> Result<String, LedgerError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyName);
    }
    Ok(trimmed.to_string())
}

/// Trims optional free text, mapping blank input to `None`.
#[must_use]
pub fn optional_text(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
}

/// Rejects dates inside a fiscal year that has been closed.
pub fn ensure_year_open(date: NaiveDate, closed_through: Option<i32>) -> Result<(), LedgerError> {
    match closed_through {
        Some(closed) if date.year() <= closed => Err(LedgerError::PeriodClosed(date.year())),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0))]
    #[case(dec!(-1))]
    #[case(dec!(-0.01))]
    #[case(dec!(10.001))]
    fn test_invalid_amounts(#[case] amount: Decimal) {
        assert!(matches!(
            validate_amount(amount, Currency::USD),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }

    #[rstest]
    #[case(dec!(0.01))]
    #[case(dec!(10))]
    #[case(dec!(10.50))]
    #[case(dec!(10.5000))]
    fn test_valid_amounts(#[case] amount: Decimal) {
        assert!(validate_amount(amount, Currency::USD).is_ok());
    }

    #[test]
    fn test_zero_decimal_currency() {
        assert!(validate_amount(dec!(1500), Currency::JPY).is_ok());
        assert!(validate_amount(dec!(1500.5), Currency::JPY).is_err());
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate(dec!(32.50)).is_ok());
        assert!(matches!(validate_rate(dec!(0)), Err(LedgerError::InvalidRate(_))));
        assert!(matches!(validate_rate(dec!(-1)), Err(LedgerError::InvalidRate(_))));
    }

    #[test]
    fn test_require_description() {
        assert_eq!(require_description("  Year end  ").unwrap(), "Year end");
        assert!(matches!(require_description("   "), Err(LedgerError::EmptyDescription)));
        assert!(matches!(require_name(""), Err(LedgerError::EmptyName)));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" rent ")), Some("rent".to_string()));
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_ensure_year_open() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert!(ensure_year_open(date, None).is_ok());
        assert!(ensure_year_open(date, Some(2023)).is_ok());
        assert!(matches!(
            ensure_year_open(date, Some(2024)),
            Err(LedgerError::PeriodClosed(2024))
        ));
        assert!(matches!(
            ensure_year_open(date, Some(2025)),
            Err(LedgerError::PeriodClosed(2024))
        ));
    }
}
