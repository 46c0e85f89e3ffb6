//! Property-based tests for the engine's posting path.
//!
//! - Balance identity holds after every committed posting or reversal
//! - The running balance equals the net of all postings still in effect
//! - A failed reversal never changes the account

use chrono::NaiveDate;
use kasa_shared::types::{Currency, TenantId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::AccountKind;
use super::error::LedgerError;
use super::posting::{Direction, PostingRequest};
use super::service::CashLedger;

#[derive(Debug, Clone)]
enum Op {
    Post(Direction, Decimal),
    Reverse(usize),
}

/// Strategy to generate positive decimal amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Income), Just(Direction::Expense)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (direction(), positive_amount()).prop_map(|(d, a)| Op::Post(d, a)),
        1 => (0usize..50).prop_map(Op::Reverse),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// *For any* sequence of postings and reversals, every committed account row
    /// satisfies the balance identity and matches the postings still in effect.
    #[test]
    fn prop_postings_keep_balance_identity(ops in prop::collection::vec(op(), 1..40)) {
        let rt = runtime();
        rt.block_on(async {
            let ledger = CashLedger::in_memory();
            let tenant = TenantId::new();
            ledger.open_tenant(tenant, None).await.unwrap();
            let account = ledger
                .create_account(tenant, "Cash", Currency::TRY, AccountKind::Cash)
                .await
                .unwrap();

            let mut posted = Vec::new();
            for op in ops {
                match op {
                    Op::Post(direction, amount) => {
                        let posting = ledger
                            .post(tenant, PostingRequest {
                                account_id: account.id,
                                direction,
                                amount,
                                effective_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                                category: None,
                                description: "generated".to_string(),
                            })
                            .await
                            .unwrap();
                        posted.push(posting.id);
                    }
                    Op::Reverse(idx) => {
                        let Some(id) = posted.get(idx).copied() else { continue };
                        let before = ledger.get_account(tenant, account.id).await.unwrap();
                        match ledger.reverse_posting(tenant, id).await {
                            Ok(_) => {}
                            Err(LedgerError::AlreadyReversed(_)) => {
                                let after = ledger.get_account(tenant, account.id).await.unwrap();
                                assert_eq!(after, before);
                            }
                            Err(other) => panic!("unexpected error {other:?}"),
                        }
                    }
                }
                let row = ledger.get_account(tenant, account.id).await.unwrap();
                assert!(row.is_balanced());
            }

            let mut expected = Decimal::ZERO;
            for id in &posted {
                let posting = ledger.get_posting(tenant, *id).await.unwrap();
                if !posting.is_reversed() {
                    expected += posting.delta().balance;
                }
            }
            let row = ledger.get_account(tenant, account.id).await.unwrap();
            assert_eq!(row.running_balance, expected);
        });
    }
}
