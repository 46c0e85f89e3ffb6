//! `SeaORM` entity definitions, one module per table.

pub mod prelude;

pub mod cash_accounts;
pub mod closing_lines;
pub mod exchange_rates;
pub mod period_closings;
pub mod postings;
pub mod tenants;
pub mod transfers;
