//! Initial schema for the cash ledger.
//!
//! Creates tenants, cash accounts, postings, transfers, exchange rates and
//! period closings. Every amount is an unconstrained NUMERIC.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(TENANTS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(POSTINGS_SQL).await?;
        db.execute_unprepared(TRANSFERS_SQL).await?;
        db.execute_unprepared(RATES_SQL).await?;
        db.execute_unprepared(CLOSINGS_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_SQL).await?;
        Ok(())
    }
}

const TENANTS_SQL: &str = r"
CREATE TABLE tenants (
    id UUID PRIMARY KEY,
    home_currency CHAR(3) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE cash_accounts (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    name VARCHAR(200) NOT NULL,
    currency CHAR(3) NOT NULL,
    kind VARCHAR(20) NOT NULL,
    running_balance NUMERIC NOT NULL DEFAULT 0,
    carry_forward NUMERIC NOT NULL DEFAULT 0,
    period_income NUMERIC NOT NULL DEFAULT 0,
    period_expense NUMERIC NOT NULL DEFAULT 0,
    period_transfer_in NUMERIC NOT NULL DEFAULT 0,
    period_transfer_out NUMERIC NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT true,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_cash_accounts_name UNIQUE (tenant_id, name),
    CONSTRAINT chk_cash_accounts_kind CHECK (kind IN ('cash', 'bank')),
    CONSTRAINT chk_cash_accounts_balance CHECK (
        running_balance = carry_forward + period_income - period_expense
            + period_transfer_in - period_transfer_out
    )
);

CREATE INDEX idx_cash_accounts_tenant ON cash_accounts(tenant_id);
";

const POSTINGS_SQL: &str = r"
CREATE TABLE postings (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES cash_accounts(id),
    direction VARCHAR(10) NOT NULL,
    amount NUMERIC NOT NULL,
    currency CHAR(3) NOT NULL,
    effective_date DATE NOT NULL,
    category VARCHAR(100),
    description TEXT NOT NULL,
    status VARCHAR(10) NOT NULL DEFAULT 'posted',
    created_at TIMESTAMPTZ NOT NULL,
    reversed_at TIMESTAMPTZ,
    CONSTRAINT chk_postings_direction CHECK (direction IN ('income', 'expense')),
    CONSTRAINT chk_postings_status CHECK (status IN ('posted', 'reversed')),
    CONSTRAINT chk_postings_amount CHECK (amount > 0),
    CONSTRAINT chk_postings_reversed CHECK ((status = 'reversed') = (reversed_at IS NOT NULL))
);

CREATE INDEX idx_postings_account ON postings(tenant_id, account_id, effective_date DESC);
";

const TRANSFERS_SQL: &str = r"
CREATE TABLE transfers (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    source_account_id UUID NOT NULL REFERENCES cash_accounts(id),
    destination_account_id UUID NOT NULL REFERENCES cash_accounts(id),
    source_amount NUMERIC NOT NULL,
    source_currency CHAR(3) NOT NULL,
    rate NUMERIC NOT NULL,
    rate_source VARCHAR(20) NOT NULL,
    rate_effective_from DATE NOT NULL,
    destination_amount NUMERIC NOT NULL,
    destination_currency CHAR(3) NOT NULL,
    effective_date DATE NOT NULL,
    description TEXT NOT NULL,
    status VARCHAR(10) NOT NULL DEFAULT 'completed',
    created_at TIMESTAMPTZ NOT NULL,
    reversed_at TIMESTAMPTZ,
    CONSTRAINT chk_transfers_distinct CHECK (source_account_id <> destination_account_id),
    CONSTRAINT chk_transfers_amounts CHECK (source_amount > 0 AND destination_amount > 0 AND rate > 0),
    CONSTRAINT chk_transfers_status CHECK (status IN ('completed', 'reversed'))
);

CREATE INDEX idx_transfers_tenant ON transfers(tenant_id, effective_date DESC);
";

const RATES_SQL: &str = r"
CREATE TABLE exchange_rates (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    base_currency CHAR(3) NOT NULL,
    quote_currency CHAR(3) NOT NULL,
    rate NUMERIC NOT NULL,
    effective_from DATE NOT NULL,
    note TEXT,
    is_active BOOLEAN NOT NULL DEFAULT true,
    sequence BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT chk_exchange_rates_positive CHECK (rate > 0),
    CONSTRAINT chk_exchange_rates_pair CHECK (base_currency <> quote_currency),
    CONSTRAINT uq_exchange_rates_sequence UNIQUE (tenant_id, sequence)
);

CREATE INDEX idx_exchange_rates_pair
    ON exchange_rates(tenant_id, base_currency, quote_currency, effective_from DESC);
";

const CLOSINGS_SQL: &str = r"
CREATE TABLE period_closings (
    id UUID PRIMARY KEY,
    tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
    fiscal_year INTEGER NOT NULL,
    description TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL,
    CONSTRAINT uq_period_closings_year UNIQUE (tenant_id, fiscal_year)
);

CREATE TABLE closing_lines (
    closing_id UUID NOT NULL REFERENCES period_closings(id) ON DELETE CASCADE,
    account_id UUID NOT NULL REFERENCES cash_accounts(id),
    line_no INTEGER NOT NULL,
    account_name VARCHAR(200) NOT NULL,
    currency CHAR(3) NOT NULL,
    active BOOLEAN NOT NULL,
    prior_carry_forward NUMERIC NOT NULL,
    period_income NUMERIC NOT NULL,
    period_expense NUMERIC NOT NULL,
    net_transfer NUMERIC NOT NULL,
    physical_balance NUMERIC NOT NULL,
    accrued_amount NUMERIC NOT NULL,
    free_balance NUMERIC NOT NULL,
    new_carry_forward NUMERIC NOT NULL,
    PRIMARY KEY (closing_id, account_id)
);
";

const DROP_SQL: &str = r"
DROP TABLE IF EXISTS closing_lines CASCADE;
DROP TABLE IF EXISTS period_closings CASCADE;
DROP TABLE IF EXISTS exchange_rates CASCADE;
DROP TABLE IF EXISTS transfers CASCADE;
DROP TABLE IF EXISTS postings CASCADE;
DROP TABLE IF EXISTS cash_accounts CASCADE;
DROP TABLE IF EXISTS tenants CASCADE;
";
