//! Multi-currency handling and exchange rates.

pub mod conversion;
pub mod exchange;
pub mod service;
pub mod table;

#[cfg(test)]
mod props;

pub use conversion::{convert_amount, convert_to};
pub use exchange::{ExchangeRate, RateQuote, RateSource};
pub use table::{RateHistory, RateTable};
