//! Field extraction from the producer's multi-line strings.
//!
//! Every field the validator reads carries its value on the second line
//! (`"<label>\n<value>"`). The extractors take that line, trim it, and return
//! `None` instead of failing when the line is missing or does not parse.

use chrono::NaiveDateTime;

/// Timestamp layout of the `dateTime` field, e.g. `Jan 05, 2024, 14:32`.
pub const ENTRY_TIME_FORMAT: &str = "%b %d, %Y, %H:%M";

/// Second line of `field`, trimmed.
#[inline]
pub fn second_line(field: &str) -> Option<&str> {
    field.split('\n').nth(1).map(str::trim)
}

/// Parse the entry timestamp out of a `dateTime` field.
///
/// The year must be exactly four digits; `%Y` alone also takes signed and
/// longer years.
pub fn extract_entry_time(date_time: Option<&str>) -> Option<NaiveDateTime> {
    let line = second_line(date_time?)?;
    if !has_four_digit_year(line) {
        return None;
    }
    NaiveDateTime::parse_from_str(line, ENTRY_TIME_FORMAT).ok()
}

/// Whether the field between the last two commas is a bare 4-digit year.
fn has_four_digit_year(line: &str) -> bool {
    let Some((date, _time)) = line.rsplit_once(',') else {
        return false;
    };
    let year = date.rsplit_once(',').map_or(date, |(_, y)| y).trim();
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}

/// Signal token (conventionally `BUY` / `SELL`) of a `signal` field.
pub fn extract_entry_signal(signal: Option<&str>) -> Option<String> {
    second_line(signal?).map(str::to_string)
}

/// Classification token (e.g. `Entry Long`, `Exit Short`) of a `type` field.
pub fn extract_trade_type(trade_type: Option<&str>) -> Option<String> {
    second_line(trade_type?).map(str::to_string)
}
