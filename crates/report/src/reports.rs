//! Table builders for each report.

use validator_core::{MatchedTriple, UnmatchedCe, UnmatchedPe};

use crate::export::MatchedRow;
use crate::summary::RunSummary;
use crate::table::{Cell, Table};

pub const CE_UNMATCHED_HEADERS: [&str; 5] = ["CE Symbol", "CE TradeNo", "Signal", "Time", "Reason"];

pub const PE_UNMATCHED_HEADERS: [&str; 6] = [
    "PE Symbol",
    "PE TradeNo",
    "Signal",
    "Trade Type",
    "Time",
    "Reason",
];

pub const SUMMARY_HEADERS: [&str; 2] = ["Metric", "Value"];

/// Matched-signals report, one row per triple.
pub fn matched_table(matched: &[MatchedTriple]) -> Table {
    let mut table = Table::new(&MatchedRow::HEADERS);
    for m in matched {
        table.push_row(MatchedRow::from(m).cells());
    }
    table
}

/// Call records without confirmation.
pub fn ce_unmatched_table(unmatched: &[UnmatchedCe]) -> Table {
    let mut table = Table::new(&CE_UNMATCHED_HEADERS);
    for u in unmatched {
        let r = &u.record;
        table.push_row(vec![
            r.symbol.clone().into(),
            r.trade_no.clone().into(),
            r.entry_signal.clone().into(),
            r.time_str().into(),
            u.reason.as_str().into(),
        ]);
    }
    table
}

/// Put records no Call claimed.
pub fn pe_unmatched_table(unmatched: &[UnmatchedPe]) -> Table {
    let mut table = Table::new(&PE_UNMATCHED_HEADERS);
    for u in unmatched {
        let r = &u.record;
        table.push_row(vec![
            r.symbol.clone().into(),
            r.trade_no.clone().into(),
            r.entry_signal.clone().into(),
            r.trade_type.as_str().into(),
            r.time_str().into(),
            u.reason.as_str().into(),
        ]);
    }
    table
}

/// Global Metric / Value summary.
pub fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new(&SUMMARY_HEADERS);
    let rows: [(&str, Cell); 7] = [
        ("Total CE Entries", summary.total_ce.into()),
        ("Total PE Entries", summary.total_pe.into()),
        ("Total INDEX Entries", summary.total_index.into()),
        ("Valid Trades", summary.valid_trades.into()),
        ("CE Not Confirmed", summary.ce_not_confirmed.into()),
        ("PE Not Confirmed", summary.pe_not_confirmed.into()),
        ("Match Percentage", summary.match_percentage.into()),
    ];
    for (metric, value) in rows {
        table.push_row(vec![metric.into(), value]);
    }
    table
}
