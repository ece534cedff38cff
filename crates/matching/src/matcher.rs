//! Cross-stream matcher.
//!
//! Walks the Call records in time order and, for each one, looks for a Put
//! record and an Index record that confirm its direction within the
//! confirmation window. Matching is greedy and single-pass: a Put record is
//! consumed by the first Call that selects it, Index records may confirm any
//! number of Calls. Call records whose signal is neither `BUY` nor `SELL`
//! are skipped without being reported.

use std::collections::HashSet;

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, info, warn};
use validator_core::config::MatchingConfig;
use validator_core::{Direction, MatchedTriple, NormalizedRecord, UnmatchedCe, UnmatchedPe};

/// Statistics about one matching pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Call records received.
    pub ce_total: usize,
    /// Call records skipped for an unrecognized signal.
    pub ce_skipped_signal: usize,
    /// Call records confirmed.
    pub matched: usize,
    /// Confirmed bullish (CE BUY).
    pub bullish: usize,
    /// Confirmed bearish (CE SELL).
    pub bearish: usize,
    /// Call records without confirmation.
    pub ce_unmatched: usize,
    /// Put records received.
    pub pe_total: usize,
    /// Put records no Call claimed.
    pub pe_unmatched: usize,
}

impl MatchStats {
    /// Matched Calls as a percentage of all Calls (0 when there are none).
    pub fn match_pct(&self) -> f64 {
        if self.ce_total > 0 {
            self.matched as f64 / self.ce_total as f64 * 100.0
        } else {
            0.0
        }
    }
}

/// Result of one matching pass.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub matched: Vec<MatchedTriple>,
    pub ce_unmatched: Vec<UnmatchedCe>,
    pub pe_unmatched: Vec<UnmatchedPe>,
    pub stats: MatchStats,
}

/// Greedy time-windowed matcher over normalized streams.
#[derive(Debug, Clone)]
pub struct CrossStreamMatcher {
    window: Duration,
}

impl Default for CrossStreamMatcher {
    fn default() -> Self {
        Self::new(Duration::seconds(60))
    }
}

impl CrossStreamMatcher {
    /// Create a matcher with an inclusive, symmetric window.
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Create a matcher from configuration.
    ///
    /// A window beyond the representable range saturates.
    pub fn from_config(config: &MatchingConfig) -> Self {
        Self::new(Duration::try_seconds(config.window_secs).unwrap_or(Duration::MAX))
    }

    /// Confirmation window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Match three streams. Every slice must be sorted ascending by entry time.
    pub fn match_streams(
        &self,
        ce: &[NormalizedRecord],
        pe: &[NormalizedRecord],
        index: &[NormalizedRecord],
    ) -> MatchOutcome {
        debug_assert!(is_time_sorted(ce) && is_time_sorted(pe) && is_time_sorted(index));

        let mut outcome = MatchOutcome::default();
        outcome.stats.ce_total = ce.len();
        outcome.stats.pe_total = pe.len();

        // Positions into `pe` already claimed by a Call.
        let mut pe_used: HashSet<usize> = HashSet::new();

        for call in ce {
            let Some(direction) = call.entry_signal.as_deref().and_then(Direction::from_ce_signal)
            else {
                outcome.stats.ce_skipped_signal += 1;
                warn!(
                    source_index = call.source_index,
                    signal = ?call.entry_signal,
                    "skipping CE record with unrecognized signal"
                );
                continue;
            };

            let pe_pos = self.first_candidate(pe, call.entry_time, direction.required_pe_signal(), |i| {
                !pe_used.contains(&i)
            });
            let index_pos =
                self.first_candidate(index, call.entry_time, direction.required_index_signal(), |_| true);

            match (pe_pos, index_pos) {
                (Some(p), Some(x)) => {
                    pe_used.insert(p);
                    debug!(
                        ce = call.source_index,
                        pe = pe[p].source_index,
                        index = index[x].source_index,
                        confirmation = direction.label(),
                        "matched CE record"
                    );
                    match direction {
                        Direction::Bullish => outcome.stats.bullish += 1,
                        Direction::Bearish => outcome.stats.bearish += 1,
                    }
                    outcome.matched.push(MatchedTriple {
                        ce: call.clone(),
                        pe: pe[p].clone(),
                        index: index[x].clone(),
                        direction,
                    });
                }
                _ => {
                    debug!(
                        ce = call.source_index,
                        pe_found = pe_pos.is_some(),
                        index_found = index_pos.is_some(),
                        "CE record not confirmed"
                    );
                    outcome.ce_unmatched.push(UnmatchedCe::new(call.clone()));
                }
            }
        }

        outcome.pe_unmatched = pe
            .iter()
            .enumerate()
            .filter(|(i, _)| !pe_used.contains(i))
            .map(|(_, r)| UnmatchedPe::new(r.clone()))
            .collect();

        outcome.stats.matched = outcome.matched.len();
        outcome.stats.ce_unmatched = outcome.ce_unmatched.len();
        outcome.stats.pe_unmatched = outcome.pe_unmatched.len();

        info!(
            ce_total = outcome.stats.ce_total,
            matched = outcome.stats.matched,
            ce_unmatched = outcome.stats.ce_unmatched,
            ce_skipped_signal = outcome.stats.ce_skipped_signal,
            pe_unmatched = outcome.stats.pe_unmatched,
            "matching complete"
        );

        outcome
    }

    /// Position of the earliest record in `records` carrying `signal` within
    /// the window around `at` and accepted by `eligible`.
    fn first_candidate(
        &self,
        records: &[NormalizedRecord],
        at: NaiveDateTime,
        signal: &str,
        eligible: impl Fn(usize) -> bool,
    ) -> Option<usize> {
        let lo = at.checked_sub_signed(self.window).unwrap_or(NaiveDateTime::MIN);
        let hi = at.checked_add_signed(self.window).unwrap_or(NaiveDateTime::MAX);
        let start = records.partition_point(|r| r.entry_time < lo);

        records[start..]
            .iter()
            .take_while(|r| r.entry_time <= hi)
            .enumerate()
            .map(|(offset, r)| (start + offset, r))
            .find(|(i, r)| r.entry_signal.as_deref() == Some(signal) && eligible(*i))
            .map(|(i, _)| i)
    }
}

fn is_time_sorted(records: &[NormalizedRecord]) -> bool {
    records.windows(2).all(|w| w[0].entry_time <= w[1].entry_time)
}
