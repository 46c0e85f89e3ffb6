//! Pure closing computation over a consistent set of account rows.

use rust_decimal::Decimal;

use super::types::{Accruals, ClosingLine};
use crate::ledger::{CashAccount, LedgerError};

/// Returns true if the account takes part in a closing.
///
/// Inactive accounts are included while they still hold money or carry
/// period activity, so nothing leaks into the next period.
#[must_use]
pub fn include_in_closing(account: &CashAccount) -> bool {
    account.is_active || !account.running_balance.is_zero() || account.has_period_activity()
}

/// Computes the closing line of one account.
///
/// Fails with `AmountOverflow` if the figures leave the decimal range.
pub fn closing_line(
    account: &CashAccount,
    accrued_amount: Decimal,
) -> Result<ClosingLine, LedgerError> {
    let overflow = || LedgerError::AmountOverflow(account.id);
    let physical_balance = account.physical_balance().ok_or_else(overflow)?;
    let net_transfer = account.net_transfer().ok_or_else(overflow)?;
    let free_balance = physical_balance
        .checked_sub(accrued_amount)
        .ok_or_else(overflow)?;
    Ok(ClosingLine {
        account_id: account.id,
        account_name: account.name.clone(),
        currency: account.currency,
        active: account.is_active,
        prior_carry_forward: account.carry_forward,
        period_income: account.period_income,
        period_expense: account.period_expense,
        net_transfer,
        physical_balance,
        accrued_amount,
        free_balance,
        new_carry_forward: physical_balance,
    })
}

/// Computes every closing line, or fails on the first drifted account.
///
/// All accounts are drift-checked, included or not.
pub fn compute_closing_lines(
    accounts: &[CashAccount],
    accruals: &Accruals,
) -> Result<Vec<ClosingLine>, LedgerError> {
    for account in accounts {
        account.check_balance()?;
    }
    accounts
        .iter()
        .filter(|a| include_in_closing(a))
        .map(|a| closing_line(a, accruals.get(a.id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kasa_shared::types::{Currency, TenantId};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use crate::ledger::AccountKind;

    fn account(carry: Decimal, income: Decimal, expense: Decimal) -> CashAccount {
        let mut acct = CashAccount::new(
            TenantId::new(),
            "Dues box".to_string(),
            Currency::TRY,
            AccountKind::Cash,
            Utc::now(),
        );
        acct.carry_forward = carry;
        acct.period_income = income;
        acct.period_expense = expense;
        acct.running_balance = carry + income - expense;
        acct
    }

    #[test]
    fn test_closing_line_example() {
        let acct = account(dec!(1000), dec!(500), dec!(200));
        let line = closing_line(&acct, Decimal::ZERO).unwrap();

        assert_eq!(line.physical_balance, dec!(1300));
        assert_eq!(line.free_balance, dec!(1300));
        assert_eq!(line.new_carry_forward, dec!(1300));
        assert_eq!(line.prior_carry_forward, dec!(1000));
        assert_eq!(line.net_transfer, Decimal::ZERO);
    }

    #[test]
    fn test_accrual_splits_free_balance() {
        let acct = account(dec!(1000), dec!(500), dec!(200));
        let line = closing_line(&acct, dec!(250)).unwrap();

        assert_eq!(line.accrued_amount, dec!(250));
        assert_eq!(line.free_balance, dec!(1050));
        assert_eq!(line.new_carry_forward, dec!(1300));
    }

    #[test]
    fn test_drift_aborts_whole_computation() {
        let good = account(dec!(100), dec!(0), dec!(0));
        let mut bad = account(dec!(100), dec!(50), dec!(0));
        bad.running_balance = dec!(999);

        let result = compute_closing_lines(&[good, bad.clone()], &Accruals::none());
        assert!(matches!(
            result,
            Err(LedgerError::BalanceDrift { account_id, .. }) if account_id == bad.id
        ));
    }

    #[test]
    fn test_accrual_beyond_decimal_range_is_an_error() {
        let acct = account(dec!(10), Decimal::ZERO, Decimal::ZERO);
        let result = closing_line(&acct, Decimal::MIN);
        assert!(matches!(
            result,
            Err(LedgerError::AmountOverflow(id)) if id == acct.id
        ));
    }

    #[test]
    fn test_aggregates_beyond_decimal_range_are_an_error() {
        let mut acct = account(Decimal::MAX, Decimal::ZERO, Decimal::ZERO);
        acct.period_income = Decimal::MAX;
        let result = compute_closing_lines(&[acct.clone()], &Accruals::none());
        assert!(matches!(
            result,
            Err(LedgerError::AmountOverflow(id)) if id == acct.id
        ));
    }

    #[test]
    fn test_inactive_accounts() {
        let mut dormant = account(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
        dormant.is_active = false;
        let mut holding = account(dec!(40), Decimal::ZERO, Decimal::ZERO);
        holding.is_active = false;
        let active = account(Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);

        let lines = compute_closing_lines(
            &[dormant.clone(), holding.clone(), active.clone()],
            &Accruals::none(),
        )
        .unwrap();
        let ids: Vec<_> = lines.iter().map(|l| l.account_id).collect();
        assert_eq!(ids, vec![holding.id, active.id]);
        assert!(!lines[0].active);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// *For any* consistent account and accrual, the new carry-forward equals
        /// the physical balance and the free/accrued split adds up.
        #[test]
        fn prop_new_carry_forward_is_physical_balance(
            carry in -1_000_000i64..1_000_000,
            income in 0i64..1_000_000,
            expense in 0i64..1_000_000,
            accrued in -100_000i64..100_000,
        ) {
            let acct = account(Decimal::new(carry, 2), Decimal::new(income, 2), Decimal::new(expense, 2));
            let line = closing_line(&acct, Decimal::new(accrued, 2)).unwrap();
            prop_assert_eq!(line.new_carry_forward, acct.running_balance);
            prop_assert_eq!(line.free_balance + line.accrued_amount, line.physical_balance);
        }
    }
}
