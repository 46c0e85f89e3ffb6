//! Shared types, errors, and configuration for Kasa.
//!
//! This crate provides common types used across all other crates:
//! - Currency codes with minor-unit precision
//! - Typed IDs for type-safe entity references
//! - Pagination types for list accessors
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
