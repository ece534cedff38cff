//! JSON artifacts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use validator_core::{Error, MatchedTriple, Result, TradeNo};

use crate::table::Cell;

/// One row of the matched-signals report. Keys are the report's column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedRow {
    #[serde(rename = "CE Symbol")]
    pub ce_symbol: Option<String>,
    #[serde(rename = "CE TradeNo")]
    pub ce_trade_no: Option<TradeNo>,
    #[serde(rename = "CE Signal")]
    pub ce_signal: String,
    #[serde(rename = "CE Time")]
    pub ce_time: String,
    #[serde(rename = "PE Symbol")]
    pub pe_symbol: Option<String>,
    #[serde(rename = "PE TradeNo")]
    pub pe_trade_no: Option<TradeNo>,
    #[serde(rename = "PE Signal")]
    pub pe_signal: String,
    #[serde(rename = "PE Time")]
    pub pe_time: String,
    #[serde(rename = "INDEX Symbol")]
    pub index_symbol: Option<String>,
    #[serde(rename = "INDEX TradeNo")]
    pub index_trade_no: Option<TradeNo>,
    #[serde(rename = "INDEX Signal")]
    pub index_signal: String,
    #[serde(rename = "INDEX Time")]
    pub index_time: String,
    #[serde(rename = "Confirmation Type")]
    pub confirmation_type: String,
    #[serde(rename = "Status")]
    pub status: String,
}

impl MatchedRow {
    pub const HEADERS: [&'static str; 14] = [
        "CE Symbol",
        "CE TradeNo",
        "CE Signal",
        "CE Time",
        "PE Symbol",
        "PE TradeNo",
        "PE Signal",
        "PE Time",
        "INDEX Symbol",
        "INDEX TradeNo",
        "INDEX Signal",
        "INDEX Time",
        "Confirmation Type",
        "Status",
    ];

    pub fn cells(&self) -> Vec<Cell> {
        vec![
            self.ce_symbol.clone().into(),
            self.ce_trade_no.clone().into(),
            self.ce_signal.clone().into(),
            self.ce_time.clone().into(),
            self.pe_symbol.clone().into(),
            self.pe_trade_no.clone().into(),
            self.pe_signal.clone().into(),
            self.pe_time.clone().into(),
            self.index_symbol.clone().into(),
            self.index_trade_no.clone().into(),
            self.index_signal.clone().into(),
            self.index_time.clone().into(),
            self.confirmation_type.clone().into(),
            self.status.clone().into(),
        ]
    }
}

impl From<&MatchedTriple> for MatchedRow {
    fn from(m: &MatchedTriple) -> Self {
        let d = m.direction;
        Self {
            ce_symbol: m.ce.symbol.clone(),
            ce_trade_no: m.ce.trade_no.clone(),
            ce_signal: d.ce_signal().to_string(),
            ce_time: m.ce.time_str(),
            pe_symbol: m.pe.symbol.clone(),
            pe_trade_no: m.pe.trade_no.clone(),
            pe_signal: d.required_pe_signal().to_string(),
            pe_time: m.pe.time_str(),
            index_symbol: m.index.symbol.clone(),
            index_trade_no: m.index.trade_no.clone(),
            index_signal: d.required_index_signal().to_string(),
            index_time: m.index.time_str(),
            confirmation_type: m.confirmation_type().to_string(),
            status: m.status().to_string(),
        }
    }
}

/// Serialize `value` as pretty JSON with `indent` spaces per level.
pub fn to_json_string<T: Serialize + ?Sized>(value: &T, indent: usize) -> Result<String> {
    let mut buf = Vec::new();
    write_pretty(&mut buf, value, indent)?;
    String::from_utf8(buf).map_err(|e| Error::Other(e.to_string()))
}

/// Write `value` as pretty JSON to `path`.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, indent: usize) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_pretty(&mut writer, value, indent)?;
    writer.flush()?;
    Ok(())
}

fn write_pretty<W: Write, T: Serialize + ?Sized>(writer: W, value: &T, indent: usize) -> Result<()> {
    let indent = " ".repeat(indent);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut ser)?;
    Ok(())
}
