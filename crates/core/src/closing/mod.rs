//! Year-end preview and irreversible period closing.
//!
//! Per tenant-year: `Open -> Previewed -> Applied`. Applied is terminal;
//! correcting a mistaken close needs an explicit compensating period.

pub mod engine;
pub mod service;
pub mod types;


pub use engine::compute_closing_lines;
pub use types::{Accruals, ClosingLine, ClosingPreview, ClosingStatus, PeriodClosingRecord};
