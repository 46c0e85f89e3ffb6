//! Conversions between ledger values and table rows.

use chrono::{DateTime, Utc};
use kasa_core::{
    AccountKind, CashAccount, ClosingLine, Direction, ExchangeRate, PeriodClosingRecord, Posting,
    PostingStatus, RateSource, Transfer, TransferStatus,
};
use kasa_shared::types::{
    CashAccountId, ClosingId, Currency, PostingId, RateId, TenantId, TransferId,
};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::Set;

use super::error::DbError;
use crate::entities::{
    cash_accounts, closing_lines, exchange_rates, period_closings, postings, transfers,
};

pub(crate) fn to_db_time(ts: DateTime<Utc>) -> DateTimeWithTimeZone {
    ts.fixed_offset()
}

fn from_db_time(ts: DateTimeWithTimeZone) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

fn currency(table: &'static str, code: &str) -> Result<Currency, DbError> {
    Currency::parse(code).map_err(|e| DbError::corrupt(table, e.to_string()))
}

// ========== Cash accounts ==========

pub(crate) fn account_row(account: &CashAccount) -> cash_accounts::ActiveModel {
    cash_accounts::ActiveModel {
        id: Set(account.id.into_inner()),
        tenant_id: Set(account.tenant_id.into_inner()),
        name: Set(account.name.clone()),
        currency: Set(account.currency.as_str().to_string()),
        kind: Set(account.kind.as_str().to_string()),
        running_balance: Set(account.running_balance),
        carry_forward: Set(account.carry_forward),
        period_income: Set(account.period_income),
        period_expense: Set(account.period_expense),
        period_transfer_in: Set(account.period_transfer_in),
        period_transfer_out: Set(account.period_transfer_out),
        is_active: Set(account.is_active),
        version: Set(account.version),
        created_at: Set(to_db_time(account.created_at)),
        updated_at: Set(to_db_time(account.updated_at)),
    }
}

pub(crate) fn account_from_row(row: cash_accounts::Model) -> Result<CashAccount, DbError> {
    const TABLE: &str = "cash_accounts";
    let kind = AccountKind::parse(&row.kind)
        .ok_or_else(|| DbError::corrupt(TABLE, format!("unknown kind '{}'", row.kind)))?;
    Ok(CashAccount {
        id: CashAccountId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        name: row.name,
        currency: currency(TABLE, &row.currency)?,
        kind,
        running_balance: row.running_balance,
        carry_forward: row.carry_forward,
        period_income: row.period_income,
        period_expense: row.period_expense,
        period_transfer_in: row.period_transfer_in,
        period_transfer_out: row.period_transfer_out,
        is_active: row.is_active,
        version: row.version,
        created_at: from_db_time(row.created_at),
        updated_at: from_db_time(row.updated_at),
    })
}

// ========== Postings ==========

pub(crate) fn posting_row(posting: &Posting) -> postings::ActiveModel {
    postings::ActiveModel {
        id: Set(posting.id.into_inner()),
        tenant_id: Set(posting.tenant_id.into_inner()),
        account_id: Set(posting.account_id.into_inner()),
        direction: Set(posting.direction.as_str().to_string()),
        amount: Set(posting.amount),
        currency: Set(posting.currency.as_str().to_string()),
        effective_date: Set(posting.effective_date),
        category: Set(posting.category.clone()),
        description: Set(posting.description.clone()),
        status: Set(posting.status.as_str().to_string()),
        created_at: Set(to_db_time(posting.created_at)),
        reversed_at: Set(posting.reversed_at.map(to_db_time)),
    }
}

pub(crate) fn posting_from_row(row: postings::Model) -> Result<Posting, DbError> {
    const TABLE: &str = "postings";
    let direction = Direction::parse(&row.direction)
        .ok_or_else(|| DbError::corrupt(TABLE, format!("unknown direction '{}'", row.direction)))?;
    let status = PostingStatus::parse(&row.status)
        .ok_or_else(|| DbError::corrupt(TABLE, format!("unknown status '{}'", row.status)))?;
    Ok(Posting {
        id: PostingId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        account_id: CashAccountId::from_uuid(row.account_id),
        direction,
        amount: row.amount,
        currency: currency(TABLE, &row.currency)?,
        effective_date: row.effective_date,
        category: row.category,
        description: row.description,
        status,
        created_at: from_db_time(row.created_at),
        reversed_at: row.reversed_at.map(from_db_time),
    })
}

// ========== Transfers ==========

pub(crate) fn transfer_row(transfer: &Transfer) -> transfers::ActiveModel {
    transfers::ActiveModel {
        id: Set(transfer.id.into_inner()),
        tenant_id: Set(transfer.tenant_id.into_inner()),
        source_account_id: Set(transfer.source_account_id.into_inner()),
        destination_account_id: Set(transfer.destination_account_id.into_inner()),
        source_amount: Set(transfer.source_amount),
        source_currency: Set(transfer.source_currency.as_str().to_string()),
        rate: Set(transfer.rate),
        rate_source: Set(transfer.rate_source.as_str().to_string()),
        rate_effective_from: Set(transfer.rate_effective_from),
        destination_amount: Set(transfer.destination_amount),
        destination_currency: Set(transfer.destination_currency.as_str().to_string()),
        effective_date: Set(transfer.effective_date),
        description: Set(transfer.description.clone()),
        status: Set(transfer.status.as_str().to_string()),
        created_at: Set(to_db_time(transfer.created_at)),
        reversed_at: Set(transfer.reversed_at.map(to_db_time)),
    }
}

pub(crate) fn transfer_from_row(row: transfers::Model) -> Result<Transfer, DbError> {
    const TABLE: &str = "transfers";
    let rate_source = RateSource::parse(&row.rate_source).ok_or_else(|| {
        DbError::corrupt(TABLE, format!("unknown rate source '{}'", row.rate_source))
    })?;
    let status = TransferStatus::parse(&row.status)
        .ok_or_else(|| DbError::corrupt(TABLE, format!("unknown status '{}'", row.status)))?;
    Ok(Transfer {
        id: TransferId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        source_account_id: CashAccountId::from_uuid(row.source_account_id),
        destination_account_id: CashAccountId::from_uuid(row.destination_account_id),
        source_amount: row.source_amount,
        source_currency: currency(TABLE, &row.source_currency)?,
        rate: row.rate,
        rate_source,
        rate_effective_from: row.rate_effective_from,
        destination_amount: row.destination_amount,
        destination_currency: currency(TABLE, &row.destination_currency)?,
        effective_date: row.effective_date,
        description: row.description,
        status,
        created_at: from_db_time(row.created_at),
        reversed_at: row.reversed_at.map(from_db_time),
    })
}

// ========== Exchange rates ==========

pub(crate) fn rate_row(
    tenant_id: TenantId,
    rate: &ExchangeRate,
) -> Result<exchange_rates::ActiveModel, DbError> {
    let sequence = i64::try_from(rate.sequence)
        .map_err(|_| DbError::corrupt("exchange_rates", "sequence out of range"))?;
    Ok(exchange_rates::ActiveModel {
        id: Set(rate.id.into_inner()),
        tenant_id: Set(tenant_id.into_inner()),
        base_currency: Set(rate.base.as_str().to_string()),
        quote_currency: Set(rate.quote.as_str().to_string()),
        rate: Set(rate.rate),
        effective_from: Set(rate.effective_from),
        note: Set(rate.note.clone()),
        is_active: Set(rate.is_active),
        sequence: Set(sequence),
        created_at: Set(to_db_time(rate.created_at)),
    })
}

pub(crate) fn rate_from_row(row: exchange_rates::Model) -> Result<ExchangeRate, DbError> {
    const TABLE: &str = "exchange_rates";
    let sequence = u64::try_from(row.sequence)
        .map_err(|_| DbError::corrupt(TABLE, format!("negative sequence {}", row.sequence)))?;
    Ok(ExchangeRate {
        id: RateId::from_uuid(row.id),
        base: currency(TABLE, &row.base_currency)?,
        quote: currency(TABLE, &row.quote_currency)?,
        rate: row.rate,
        effective_from: row.effective_from,
        note: row.note,
        is_active: row.is_active,
        sequence,
        created_at: from_db_time(row.created_at),
    })
}

// ========== Period closings ==========

pub(crate) fn closing_row(record: &PeriodClosingRecord) -> period_closings::ActiveModel {
    period_closings::ActiveModel {
        id: Set(record.id.into_inner()),
        tenant_id: Set(record.tenant_id.into_inner()),
        fiscal_year: Set(record.fiscal_year),
        description: Set(record.description.clone()),
        applied_at: Set(to_db_time(record.applied_at)),
    }
}

pub(crate) fn closing_line_rows(
    record: &PeriodClosingRecord,
) -> Result<Vec<closing_lines::ActiveModel>, DbError> {
    record
        .lines
        .iter()
        .enumerate()
        .map(|(idx, line)| {
            let line_no = i32::try_from(idx)
                .map_err(|_| DbError::corrupt("closing_lines", "too many lines"))?;
            Ok(closing_lines::ActiveModel {
                closing_id: Set(record.id.into_inner()),
                account_id: Set(line.account_id.into_inner()),
                line_no: Set(line_no),
                account_name: Set(line.account_name.clone()),
                currency: Set(line.currency.as_str().to_string()),
                active: Set(line.active),
                prior_carry_forward: Set(line.prior_carry_forward),
                period_income: Set(line.period_income),
                period_expense: Set(line.period_expense),
                net_transfer: Set(line.net_transfer),
                physical_balance: Set(line.physical_balance),
                accrued_amount: Set(line.accrued_amount),
                free_balance: Set(line.free_balance),
                new_carry_forward: Set(line.new_carry_forward),
            })
        })
        .collect()
}

/// Rebuilds a closing record. `lines` must already be ordered by `line_no`.
pub(crate) fn closing_from_rows(
    row: period_closings::Model,
    lines: Vec<closing_lines::Model>,
) -> Result<PeriodClosingRecord, DbError> {
    let lines = lines
        .into_iter()
        .map(|line| {
            Ok(ClosingLine {
                account_id: CashAccountId::from_uuid(line.account_id),
                account_name: line.account_name,
                currency: currency("closing_lines", &line.currency)?,
                active: line.active,
                prior_carry_forward: line.prior_carry_forward,
                period_income: line.period_income,
                period_expense: line.period_expense,
                net_transfer: line.net_transfer,
                physical_balance: line.physical_balance,
                accrued_amount: line.accrued_amount,
                free_balance: line.free_balance,
                new_carry_forward: line.new_carry_forward,
            })
        })
        .collect::<Result<Vec<_>, DbError>>()?;

    Ok(PeriodClosingRecord {
        id: ClosingId::from_uuid(row.id),
        tenant_id: TenantId::from_uuid(row.tenant_id),
        fiscal_year: row.fiscal_year,
        description: row.description,
        lines,
        applied_at: from_db_time(row.applied_at),
    })
}
