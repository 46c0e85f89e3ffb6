//! Entity aliases.

pub use super::cash_accounts::Entity as CashAccounts;
pub use super::closing_lines::Entity as ClosingLines;
pub use super::exchange_rates::Entity as ExchangeRates;
pub use super::period_closings::Entity as PeriodClosings;
pub use super::postings::Entity as Postings;
pub use super::tenants::Entity as Tenants;
pub use super::transfers::Entity as Transfers;
