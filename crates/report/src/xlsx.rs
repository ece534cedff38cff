//! Spreadsheet rendering of a [`Table`].
//!
//! Bold header row, header frozen, every column sized to its widest value
//! plus padding. The document creation time is supplied by the caller so
//! equal inputs give byte-identical files.

use std::path::Path;

use chrono::{Datelike, NaiveDateTime, Timelike};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook, XlsxError};
use tracing::debug;
use validator_core::{Error, Result};

use crate::table::{Cell, Table};

/// Write `table` as a single-sheet workbook at `path`, stamped as created
/// at `created_at`.
pub fn write_table(table: &Table, path: &Path, padding: usize, created_at: &NaiveDateTime) -> Result<()> {
    build_workbook(table, padding, created_at)
        .and_then(|mut workbook| workbook.save(path))
        .map_err(|e| Error::report(format!("{}: {}", path.display(), e)))?;

    debug!(path = %path.display(), rows = table.rows.len(), "wrote spreadsheet");
    Ok(())
}

fn excel_time(at: &NaiveDateTime) -> std::result::Result<ExcelDateTime, XlsxError> {
    let year = u16::try_from(at.year()).map_err(|_| XlsxError::DateTimeRangeError(at.to_string()))?;
    ExcelDateTime::from_ymd(year, at.month() as u8, at.day() as u8)?.and_hms(
        at.hour() as u16,
        at.minute() as u8,
        at.second(),
    )
}

fn build_workbook(
    table: &Table,
    padding: usize,
    created_at: &NaiveDateTime,
) -> std::result::Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let properties = DocProperties::new().set_creation_datetime(&excel_time(created_at)?);
    workbook.set_properties(&properties);
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header.as_str(), &bold)?;
    }

    for (i, row) in table.rows.iter().enumerate() {
        let r = i as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let c = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(r, c, s.as_str())?;
                }
                Cell::Int(n) => {
                    sheet.write_number(r, c, *n as f64)?;
                }
                Cell::Number(x) => {
                    sheet.write_number(r, c, *x)?;
                }
            }
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    for (col, width) in table.column_widths(padding).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width as f64)?;
    }

    Ok(workbook)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(16, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.xlsx");

        let mut table = Table::new(&["Metric", "Value"]);
        table.push_row(vec!["Valid Trades".into(), Cell::Int(3)]);
        table.push_row(vec!["Match Percentage".into(), Cell::Number(42.86)]);
        write_table(&table, &path, 3, &make_time()).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_writes_header_only_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        write_table(&Table::new(&["Symbol", "Reason"]), &path, 3, &make_time()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_directory_is_report_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.xlsx");
        let err = write_table(&Table::new(&["A"]), &path, 3, &make_time()).unwrap_err();
        assert!(matches!(err, Error::Report(_)));
    }

    #[test]
    fn test_same_input_gives_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.xlsx");
        let second = dir.path().join("second.xlsx");

        let mut table = Table::new(&["Symbol", "Reason"]);
        table.push_row(vec!["NIFTY".into(), "No CE confirmation".into()]);

        write_table(&table, &first, 3, &make_time()).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        write_table(&table, &second, 3, &make_time()).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }
}
