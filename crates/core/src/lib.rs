//! Core types and configuration for the trade validator.
//!
//! This crate provides shared types used across all other crates:
//! - Raw and normalized signal records for the CE, PE and INDEX streams
//! - Match results (matched triples, unmatched leftovers)
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{Error, FetchFailure, Result};
pub use types::*;
