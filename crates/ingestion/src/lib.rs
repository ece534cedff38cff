//! Record extraction and normalization for the trade validator.
//!
//! This crate handles:
//! - Pulling typed values out of the producer's multi-line fields
//! - Dropping records without a parseable entry time
//! - Keeping entry records only
//! - Sorting each stream by entry time

pub mod extractor;
pub mod normalizer;

pub use extractor::{extract_entry_signal, extract_entry_time, extract_trade_type, second_line};
pub use normalizer::{normalize_streams, NormalizationStats, RecordNormalizer};
