//! Core data types for the trade validator.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Format used for every timestamp written into a report.
pub const REPORT_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Reason attached to a Call record that found no confirmation.
pub const CE_UNMATCHED_REASON: &str = "PE or INDEX confirmation missing";

/// Reason attached to a Put record no Call record claimed.
pub const PE_UNMATCHED_REASON: &str = "No CE confirmation";

/// Status written for every matched triple.
pub const VALID_STATUS: &str = "VALID";

/// Render a timestamp in report format (`DD-MM-YYYY HH:MM:SS`).
#[inline]
pub fn format_report_time(ts: &NaiveDateTime) -> String {
    ts.format(REPORT_TIME_FORMAT).to_string()
}

/// One of the three input streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stream {
    /// Call-side option signals.
    #[serde(rename = "CE")]
    Ce,
    /// Put-side option signals.
    #[serde(rename = "PE")]
    Pe,
    /// Underlying index signals (confirmation only).
    #[serde(rename = "INDEX")]
    Index,
}

impl Stream {
    /// All streams in processing order.
    pub const ALL: [Stream; 3] = [Stream::Ce, Stream::Pe, Stream::Index];

    /// Upper-case name used in messages and report headers.
    pub fn as_str(self) -> &'static str {
        match self {
            Stream::Ce => "CE",
            Stream::Pe => "PE",
            Stream::Index => "INDEX",
        }
    }
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stream {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CE" => Ok(Stream::Ce),
            "PE" => Ok(Stream::Pe),
            "INDEX" => Ok(Stream::Index),
            other => Err(Error::data(format!("unknown stream '{}'", other))),
        }
    }
}

/// One value per stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streams<T> {
    pub ce: T,
    pub pe: T,
    pub index: T,
}

impl<T> Streams<T> {
    pub fn new(ce: T, pe: T, index: T) -> Self {
        Self { ce, pe, index }
    }

    /// Borrow the value for one stream.
    pub fn get(&self, stream: Stream) -> &T {
        match stream {
            Stream::Ce => &self.ce,
            Stream::Pe => &self.pe,
            Stream::Index => &self.index,
        }
    }

    /// Apply `f` to each stream's value.
    pub fn map<U>(self, mut f: impl FnMut(Stream, T) -> U) -> Streams<U> {
        Streams {
            ce: f(Stream::Ce, self.ce),
            pe: f(Stream::Pe, self.pe),
            index: f(Stream::Index, self.index),
        }
    }
}

/// Opaque trade identifier as sent by the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TradeNo {
    Int(i64),
    Float(f64),
    Text(String),
}

impl TradeNo {
    /// Numeric value, when the producer sent a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TradeNo::Int(n) => Some(*n as f64),
            TradeNo::Float(n) => Some(*n),
            TradeNo::Text(_) => None,
        }
    }
}

impl fmt::Display for TradeNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeNo::Int(n) => write!(f, "{}", n),
            TradeNo::Float(n) => write!(f, "{}", n),
            TradeNo::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for TradeNo {
    fn from(n: i64) -> Self {
        TradeNo::Int(n)
    }
}

impl From<&str> for TradeNo {
    fn from(s: &str) -> Self {
        TradeNo::Text(s.to_string())
    }
}

/// One input item from a stream, exactly as the producer sends it.
///
/// `dateTime`, `signal` and `type` are multi-line strings whose real value
/// sits on the second line. A field of an unexpected JSON type never fails
/// the record: numbers and booleans are kept as their text, arrays and
/// objects read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub symbol: Option<String>,
    #[serde(rename = "tradeNo", default, deserialize_with = "lenient_trade_no")]
    pub trade_no: Option<TradeNo>,
    #[serde(rename = "dateTime", default, deserialize_with = "lenient_text")]
    pub date_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub signal: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_text")]
    pub trade_type: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_trade_no<'de, D>(deserializer: D) -> std::result::Result<Option<TradeNo>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_i64()
            .map(TradeNo::Int)
            .or_else(|| n.as_f64().map(TradeNo::Float)),
        serde_json::Value::String(s) => Some(TradeNo::Text(s)),
        _ => None,
    })
}

impl RawRecord {
    /// Build a record with every field present.
    pub fn new(
        symbol: impl Into<String>,
        trade_no: impl Into<TradeNo>,
        date_time: impl Into<String>,
        signal: impl Into<String>,
        trade_type: impl Into<String>,
    ) -> Self {
        Self {
            symbol: Some(symbol.into()),
            trade_no: Some(trade_no.into()),
            date_time: Some(date_time.into()),
            signal: Some(signal.into()),
            trade_type: Some(trade_type.into()),
        }
    }
}

/// A raw record with its extracted fields, kept only when it is a
/// time-stamped entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    /// Position of the record in its input sequence. Identifies the record.
    pub source_index: usize,
    pub symbol: Option<String>,
    pub trade_no: Option<TradeNo>,
    pub entry_time: NaiveDateTime,
    pub entry_signal: Option<String>,
    pub trade_type: String,
}

impl NormalizedRecord {
    /// Entry time in report format.
    pub fn time_str(&self) -> String {
        format_report_time(&self.entry_time)
    }
}

/// Direction implied by a Call-side signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// CE BUY, confirmed by PE SELL and INDEX BUY.
    Bullish,
    /// CE SELL, confirmed by PE BUY and INDEX SELL.
    Bearish,
}

impl Direction {
    /// Direction for a Call-side signal token. Anything but `BUY`/`SELL` has none.
    pub fn from_ce_signal(signal: &str) -> Option<Self> {
        match signal {
            "BUY" => Some(Direction::Bullish),
            "SELL" => Some(Direction::Bearish),
            _ => None,
        }
    }

    pub fn ce_signal(self) -> &'static str {
        match self {
            Direction::Bullish => "BUY",
            Direction::Bearish => "SELL",
        }
    }

    /// Signal a Put record needs to confirm this direction.
    pub fn required_pe_signal(self) -> &'static str {
        match self {
            Direction::Bullish => "SELL",
            Direction::Bearish => "BUY",
        }
    }

    /// Signal an Index record needs to confirm this direction.
    pub fn required_index_signal(self) -> &'static str {
        self.ce_signal()
    }

    /// Confirmation label written into the reports.
    pub fn label(self) -> &'static str {
        match self {
            Direction::Bullish => "CE Bullish Confirmed",
            Direction::Bearish => "CE Bearish Confirmed",
        }
    }
}

/// A Call record confirmed by one Put record and one Index record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchedTriple {
    pub ce: NormalizedRecord,
    pub pe: NormalizedRecord,
    pub index: NormalizedRecord,
    pub direction: Direction,
}

impl MatchedTriple {
    pub fn confirmation_type(&self) -> &'static str {
        self.direction.label()
    }

    pub fn status(&self) -> &'static str {
        VALID_STATUS
    }
}

/// A Call record without confirmation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedCe {
    pub record: NormalizedRecord,
    pub reason: String,
}

impl UnmatchedCe {
    pub fn new(record: NormalizedRecord) -> Self {
        Self {
            record,
            reason: CE_UNMATCHED_REASON.to_string(),
        }
    }
}

/// A Put record no Call record claimed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedPe {
    pub record: NormalizedRecord,
    pub reason: String,
}

impl UnmatchedPe {
    pub fn new(record: NormalizedRecord) -> Self {
        Self {
            record,
            reason: PE_UNMATCHED_REASON.to_string(),
        }
    }
}

/// Request payload carrying the three streams.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationRequest {
    #[serde(default)]
    pub ce_data: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub pe_data: Option<Vec<RawRecord>>,
    #[serde(default)]
    pub index_data: Option<Vec<RawRecord>>,
}

impl ValidationRequest {
    /// Split into streams, rejecting a payload with any stream missing or empty.
    pub fn into_streams(self) -> Result<Streams<Vec<RawRecord>>> {
        match (self.ce_data, self.pe_data, self.index_data) {
            (Some(ce), Some(pe), Some(index))
                if !ce.is_empty() && !pe.is_empty() && !index.is_empty() =>
            {
                Ok(Streams::new(ce, pe, index))
            }
            _ => Err(Error::data("Missing JSON data")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_format_report_time() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(14, 32, 7)
            .unwrap();
        assert_eq!(format_report_time(&ts), "05-01-2024 14:32:07");
    }

    #[test]
    fn test_direction_table() {
        let bull = Direction::from_ce_signal("BUY").unwrap();
        assert_eq!(bull.required_pe_signal(), "SELL");
        assert_eq!(bull.required_index_signal(), "BUY");
        assert_eq!(bull.label(), "CE Bullish Confirmed");

        let bear = Direction::from_ce_signal("SELL").unwrap();
        assert_eq!(bear.required_pe_signal(), "BUY");
        assert_eq!(bear.required_index_signal(), "SELL");
        assert_eq!(bear.label(), "CE Bearish Confirmed");

        assert_eq!(Direction::from_ce_signal("buy"), None);
        assert_eq!(Direction::from_ce_signal(""), None);
    }

    #[test]
    fn test_stream_parse() {
        assert_eq!("ce".parse::<Stream>().unwrap(), Stream::Ce);
        assert_eq!(" INDEX ".parse::<Stream>().unwrap(), Stream::Index);
        assert!("call".parse::<Stream>().is_err());
    }

    #[test]
    fn test_raw_record_wire_shape() {
        let json = r#"[
            {"symbol": "NIFTY24JAN21000CE", "tradeNo": 12, "dateTime": "Entry\nJan 05, 2024, 14:32",
             "signal": "Signal\nBUY", "type": "Type\nEntry Long"},
            {"symbol": null, "tradeNo": "T-7", "signal": "x"}
        ]"#;
        let records: Vec<RawRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].trade_no, Some(TradeNo::Int(12)));
        assert_eq!(records[0].trade_type.as_deref(), Some("Type\nEntry Long"));
        assert_eq!(records[1].symbol, None);
        assert_eq!(records[1].trade_no, Some(TradeNo::Text("T-7".into())));
        assert_eq!(records[1].date_time, None);
    }

    #[test]
    fn test_raw_record_tolerates_mixed_field_types() {
        let json = r#"{"symbol": 12345, "tradeNo": [1], "dateTime": 0,
            "signal": true, "type": {"k": "v"}}"#;
        let record: RawRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.symbol.as_deref(), Some("12345"));
        assert_eq!(record.trade_no, None);
        assert_eq!(record.date_time.as_deref(), Some("0"));
        assert_eq!(record.signal.as_deref(), Some("true"));
        assert_eq!(record.trade_type, None);

        let record: RawRecord = serde_json::from_str(r#"{"tradeNo": 2.5}"#).unwrap();
        assert_eq!(record.trade_no, Some(TradeNo::Float(2.5)));
    }

    #[test]
    fn test_request_requires_all_streams() {
        let rec = RawRecord::new("A", 1_i64, "x\nJan 05, 2024, 14:32", "s\nBUY", "t\nEntry");
        let ok = ValidationRequest {
            ce_data: Some(vec![rec.clone()]),
            pe_data: Some(vec![rec.clone()]),
            index_data: Some(vec![rec.clone()]),
        };
        assert!(ok.into_streams().is_ok());

        let missing = ValidationRequest {
            ce_data: Some(vec![rec.clone()]),
            pe_data: Some(vec![]),
            index_data: Some(vec![rec]),
        };
        let err = missing.into_streams().unwrap_err();
        assert_eq!(err.to_string(), "Data error: Missing JSON data");
    }
}
