//! Database seeder for Kasa development and testing.
//!
//! Opens a demo tenant with a few accounts, rates, postings and a
//! cross-currency transfer. Every write goes through the ledger engine and
//! its Postgres journal, so the seeded rows satisfy the same invariants as
//! real traffic. Running it twice is a no-op.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use kasa_core::{
    AccountKind, CashLedger, Direction, LedgerSettings, PostingRequest, TransferRequest,
};
use kasa_db::{LedgerRepository, PgJournal};
use kasa_shared::AppConfig;
use kasa_shared::types::{Currency, TenantId};
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Demo tenant ID (consistent for all seeds)
const DEMO_TENANT_ID: Uuid = Uuid::from_u128(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kasa=debug,kasa_core=debug,kasa_db=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let settings = LedgerSettings::from_config(&config.ledger)?;

    let db = kasa_db::connect_with(&config.database).await?;
    info!("Connected to database");

    let tenant = TenantId::from_uuid(DEMO_TENANT_ID);
    let repo = LedgerRepository::new(db.clone());
    if repo.load_tenant(tenant).await?.is_some() {
        info!(tenant_id = %tenant, "Demo tenant already seeded");
        return Ok(());
    }

    let ledger = CashLedger::new(Arc::new(PgJournal::new(db)), settings);
    seed_demo_tenant(&ledger, tenant).await?;

    info!(tenant_id = %tenant, "Seeding complete");
    Ok(())
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid seed date")
}

async fn seed_demo_tenant(ledger: &CashLedger, tenant: TenantId) -> anyhow::Result<()> {
    ledger.open_tenant(tenant, Some(Currency::TRY)).await?;

    let cash = ledger
        .create_account(tenant, "Cash Register", Currency::TRY, AccountKind::Cash)
        .await?;
    let bank = ledger
        .create_account(tenant, "Main Bank", Currency::TRY, AccountKind::Bank)
        .await?;
    let usd = ledger
        .create_account(tenant, "USD Bank", Currency::USD, AccountKind::Bank)
        .await?;
    let eur = ledger
        .create_account(tenant, "EUR Bank", Currency::EUR, AccountKind::Bank)
        .await?;
    info!("Seeded accounts");

    let rates = [
        (Currency::USD, Currency::TRY, dec!(32.50), date(2025, 1, 1)?),
        (Currency::EUR, Currency::TRY, dec!(35.10), date(2025, 1, 1)?),
        (Currency::USD, Currency::TRY, dec!(33.20), date(2025, 4, 1)?),
    ];
    for (base, quote, rate, effective_from) in rates {
        ledger
            .set_rate(tenant, base, quote, rate, effective_from, Some("seed"))
            .await?;
    }
    info!("Seeded exchange rates");

    let postings = [
        (cash.id, Direction::Income, dec!(12500.00), date(2025, 1, 15)?, "Counter sales"),
        (cash.id, Direction::Expense, dec!(1800.00), date(2025, 1, 20)?, "Office supplies"),
        (bank.id, Direction::Income, dec!(45000.00), date(2025, 2, 1)?, "Customer invoice"),
        (bank.id, Direction::Expense, dec!(15000.00), date(2025, 2, 5)?, "Rent"),
        (usd.id, Direction::Income, dec!(2000.00), date(2025, 3, 1)?, "Export receipt"),
        (eur.id, Direction::Income, dec!(750.00), date(2025, 3, 10)?, "Consulting fee"),
    ];
    for (account_id, direction, amount, effective_date, description) in postings {
        ledger
            .post(
                tenant,
                PostingRequest {
                    account_id,
                    direction,
                    amount,
                    effective_date,
                    category: None,
                    description: description.to_string(),
                },
            )
            .await?;
    }
    info!("Seeded postings");

    // USD -> TRY at the April rate, EUR -> USD through the TRY cross-rate.
    ledger
        .transfer(
            tenant,
            TransferRequest {
                source_account_id: usd.id,
                destination_account_id: bank.id,
                amount: dec!(500.00),
                effective_date: date(2025, 4, 10)?,
                description: "Convert USD".to_string(),
                rate_override: None,
            },
        )
        .await?;
    ledger
        .transfer(
            tenant,
            TransferRequest {
                source_account_id: eur.id,
                destination_account_id: usd.id,
                amount: dec!(200.00),
                effective_date: date(2025, 4, 12)?,
                description: "Rebalance EUR".to_string(),
                rate_override: None,
            },
        )
        .await?;
    info!("Seeded transfers");

    Ok(())
}
