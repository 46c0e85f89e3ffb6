//! Same- and cross-currency transfers between accounts of one tenant.
//!
//! A transfer debits the source on `period_transfer_out` and credits the
//! destination on `period_transfer_in`; both rows commit together or not at
//! all.

pub mod service;
pub mod types;

#[cfg(test)]
mod tests;

pub use types::{Transfer, TransferRequest, TransferStatus};
