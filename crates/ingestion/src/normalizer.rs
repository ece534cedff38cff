//! Record normalization.
//!
//! Turns a stream of raw records into time-sorted entry records: extract the
//! typed fields, drop records without a parseable entry time, keep records
//! whose classification contains `Entry`, stable-sort by entry time.

use tracing::{debug, info};
use validator_core::{NormalizedRecord, RawRecord, Stream, Streams};

use crate::extractor::{extract_entry_signal, extract_entry_time, extract_trade_type};

/// Substring that marks a position-opening record.
pub const ENTRY_MARKER: &str = "Entry";

/// Statistics about one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizationStats {
    /// Records received.
    pub total: usize,
    /// Records dropped for a missing or unparseable entry time.
    pub bad_time: usize,
    /// Records dropped because they are not entries.
    pub non_entry: usize,
    /// Records kept.
    pub kept: usize,
}

impl NormalizationStats {
    /// Fraction of received records that were kept.
    pub fn kept_frac(&self) -> f64 {
        if self.total > 0 {
            self.kept as f64 / self.total as f64
        } else {
            0.0
        }
    }

    /// Reset statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Normalizer for one stream.
pub struct RecordNormalizer {
    stream: Stream,
    stats: NormalizationStats,
}

impl RecordNormalizer {
    /// Create a normalizer for `stream`.
    pub fn new(stream: Stream) -> Self {
        Self {
            stream,
            stats: NormalizationStats::default(),
        }
    }

    /// Normalize a single record. `source_index` is its position in the input.
    pub fn normalize_one(&mut self, source_index: usize, raw: &RawRecord) -> Option<NormalizedRecord> {
        self.stats.total += 1;

        let Some(entry_time) = extract_entry_time(raw.date_time.as_deref()) else {
            self.stats.bad_time += 1;
            debug!(stream = %self.stream, source_index, "dropping record without parseable entry time");
            return None;
        };

        let trade_type = match extract_trade_type(raw.trade_type.as_deref()) {
            Some(t) if t.contains(ENTRY_MARKER) => t,
            _ => {
                self.stats.non_entry += 1;
                return None;
            }
        };

        self.stats.kept += 1;

        Some(NormalizedRecord {
            source_index,
            symbol: raw.symbol.clone(),
            trade_no: raw.trade_no.clone(),
            entry_time,
            entry_signal: extract_entry_signal(raw.signal.as_deref()),
            trade_type,
        })
    }

    /// Normalize a whole stream, sorted ascending by entry time.
    ///
    /// The sort is stable: records with equal times keep their input order.
    pub fn normalize(&mut self, records: &[RawRecord]) -> Vec<NormalizedRecord> {
        let mut result: Vec<NormalizedRecord> = records
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| self.normalize_one(i, raw))
            .collect();

        result.sort_by_key(|r| r.entry_time);
        result
    }

    /// Get normalization statistics.
    pub fn stats(&self) -> &NormalizationStats {
        &self.stats
    }

    /// Reset statistics.
    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }
}

/// Normalize all three streams.
pub fn normalize_streams(
    ce: &[RawRecord],
    pe: &[RawRecord],
    index: &[RawRecord],
) -> Streams<Vec<NormalizedRecord>> {
    Streams::new(
        normalize_stream(Stream::Ce, ce),
        normalize_stream(Stream::Pe, pe),
        normalize_stream(Stream::Index, index),
    )
}

fn normalize_stream(stream: Stream, records: &[RawRecord]) -> Vec<NormalizedRecord> {
    let mut normalizer = RecordNormalizer::new(stream);
    let normalized = normalizer.normalize(records);
    let stats = normalizer.stats();
    info!(
        stream = %stream,
        total = stats.total,
        bad_time = stats.bad_time,
        non_entry = stats.non_entry,
        kept = stats.kept,
        "normalized stream"
    );
    normalized
}
