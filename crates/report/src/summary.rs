//! Run summary statistics and the metadata digest.

use std::collections::BTreeSet;
use std::fmt::Write;

use chrono::NaiveDateTime;
use serde::Serialize;
use validator_core::{format_report_time, NormalizedRecord, Streams};
use validator_matching::MatchOutcome;

/// Layout of `generated_at` in the metadata digest and text summary.
pub const GENERATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Round to two decimals.
#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `part / whole * 100`, or 0 when `whole` is 0.
#[inline]
fn percent(part: usize, whole: usize) -> f64 {
    if whole > 0 {
        part as f64 / whole as f64 * 100.0
    } else {
        0.0
    }
}

/// Counts and ratios of one validation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Normalized Call entries.
    pub total_ce: usize,
    /// Normalized Put entries.
    pub total_pe: usize,
    /// Normalized Index entries.
    pub total_index: usize,
    /// Matched triples.
    pub valid_trades: usize,
    /// Call entries without confirmation.
    pub ce_not_confirmed: usize,
    /// Put entries no Call claimed.
    pub pe_not_confirmed: usize,
    /// Call entries skipped for an unrecognized signal.
    pub ce_skipped_signal: usize,
    /// Matched triples confirmed bullish.
    pub bullish: usize,
    /// Matched triples confirmed bearish.
    pub bearish: usize,
    /// `valid_trades / total_ce * 100`, two decimals; 0 without Call entries.
    pub match_percentage: f64,
}

impl RunSummary {
    /// Summarize a matching pass over `streams`.
    pub fn new(streams: &Streams<Vec<NormalizedRecord>>, outcome: &MatchOutcome) -> Self {
        let total_ce = streams.ce.len();
        let valid_trades = outcome.matched.len();

        Self {
            total_ce,
            total_pe: streams.pe.len(),
            total_index: streams.index.len(),
            valid_trades,
            ce_not_confirmed: outcome.ce_unmatched.len(),
            pe_not_confirmed: outcome.pe_unmatched.len(),
            ce_skipped_signal: outcome.stats.ce_skipped_signal,
            bullish: outcome.stats.bullish,
            bearish: outcome.stats.bearish,
            match_percentage: round2(percent(valid_trades, total_ce)),
        }
    }

    /// Bullish share of valid trades, two decimals.
    pub fn bullish_pct(&self) -> f64 {
        round2(percent(self.bullish, self.valid_trades))
    }

    /// Bearish share of valid trades, two decimals.
    pub fn bearish_pct(&self) -> f64 {
        round2(percent(self.bearish, self.valid_trades))
    }

    /// Human-readable summary written next to the matched report.
    pub fn text_report(&self, generated_at: &NaiveDateTime) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "Trade Validation Summary");
        let _ = writeln!(out, "Generated At: {}", generated_at.format(GENERATED_AT_FORMAT));
        let _ = writeln!(out);
        let _ = writeln!(out, "Total CE Entries: {}", self.total_ce);
        let _ = writeln!(out, "Total PE Entries: {}", self.total_pe);
        let _ = writeln!(out, "Total INDEX Entries: {}", self.total_index);
        let _ = writeln!(out);
        let _ = writeln!(out, "Total Valid Matches: {}", self.valid_trades);
        let _ = writeln!(
            out,
            "CE Bullish Confirmed: {} ({:.2}%)",
            self.bullish,
            self.bullish_pct()
        );
        let _ = writeln!(
            out,
            "CE Bearish Confirmed: {} ({:.2}%)",
            self.bearish,
            self.bearish_pct()
        );
        let _ = writeln!(out, "Match Percentage: {:.2}%", self.match_percentage);
        out
    }
}

/// Metadata digest written at the root of the run directory.
///
/// Field order is the key order of the JSON file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationMeta {
    pub generated_at: String,
    pub ce_symbols: Vec<String>,
    pub pe_symbols: Vec<String>,
    pub index_symbols: Vec<String>,
    pub ce_min_time: Option<String>,
    pub ce_max_time: Option<String>,
    pub pe_min_time: Option<String>,
    pub pe_max_time: Option<String>,
    pub index_min_time: Option<String>,
    pub index_max_time: Option<String>,
    pub total_ce_entries: usize,
    pub total_pe_entries: usize,
    pub total_index_entries: usize,
    pub total_valid_matches: usize,
}

impl ValidationMeta {
    pub fn new(
        generated_at: &NaiveDateTime,
        streams: &Streams<Vec<NormalizedRecord>>,
        total_valid_matches: usize,
    ) -> Self {
        let (ce_min_time, ce_max_time) = time_range(&streams.ce);
        let (pe_min_time, pe_max_time) = time_range(&streams.pe);
        let (index_min_time, index_max_time) = time_range(&streams.index);

        Self {
            generated_at: generated_at.format(GENERATED_AT_FORMAT).to_string(),
            ce_symbols: unique_symbols(&streams.ce),
            pe_symbols: unique_symbols(&streams.pe),
            index_symbols: unique_symbols(&streams.index),
            ce_min_time,
            ce_max_time,
            pe_min_time,
            pe_max_time,
            index_min_time,
            index_max_time,
            total_ce_entries: streams.ce.len(),
            total_pe_entries: streams.pe.len(),
            total_index_entries: streams.index.len(),
            total_valid_matches,
        }
    }
}

/// Sorted distinct symbols, ignoring records without one.
fn unique_symbols(records: &[NormalizedRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.symbol.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Earliest and latest entry time in report format; `None` for an empty stream.
fn time_range(records: &[NormalizedRecord]) -> (Option<String>, Option<String>) {
    let min = records.iter().map(|r| r.entry_time).min();
    let max = records.iter().map(|r| r.entry_time).max();
    (
        min.as_ref().map(format_report_time),
        max.as_ref().map(format_report_time),
    )
}
