//! Report generation and the validation entry point.
//!
//! This crate provides:
//! - Tabular reports (matched signals, unmatched CE/PE, summary) as spreadsheets
//! - JSON export of the matched signals and the run metadata digest
//! - A plain-text summary of bullish/bearish confirmations
//! - The run-scoped output directory and `run_validation`

pub mod export;
pub mod layout;
pub mod reports;
pub mod runner;
pub mod summary;
pub mod table;
pub mod xlsx;

pub use layout::RunLayout;
pub use runner::{run_validation, RunResult, ValidationRun, ValidationRunner};
pub use summary::{RunSummary, ValidationMeta};
pub use table::{Cell, Table};
