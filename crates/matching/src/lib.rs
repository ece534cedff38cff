//! Cross-stream matching for the trade validator.
//!
//! This crate provides:
//! - Directional confirmation of Call records by Put and Index records
//! - The confirmation time window
//! - Matched triples and unmatched leftovers with match statistics

pub mod matcher;

pub use matcher::{CrossStreamMatcher, MatchOutcome, MatchStats};
