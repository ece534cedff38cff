//! In-memory tables rendered into the spreadsheet reports.

use validator_core::TradeNo;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Number(f64),
}

impl Cell {
    /// Width of the value as displayed, in characters.
    pub fn display_len(&self) -> usize {
        match self {
            Cell::Empty => 0,
            Cell::Text(s) => s.chars().count(),
            Cell::Int(n) => n.to_string().len(),
            Cell::Number(x) => x.to_string().len(),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<Option<String>> for Cell {
    fn from(s: Option<String>) -> Self {
        s.map_or(Cell::Empty, Cell::Text)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Int(n as i64)
    }
}

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Number(x)
    }
}

impl From<Option<TradeNo>> for Cell {
    fn from(t: Option<TradeNo>) -> Self {
        match t {
            None => Cell::Empty,
            Some(TradeNo::Int(n)) => Cell::Int(n),
            Some(TradeNo::Float(x)) => Cell::Number(x),
            Some(TradeNo::Text(s)) => Cell::Text(s),
        }
    }
}

/// A header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create an empty table with the given headers.
    pub fn new<S: AsRef<str>>(headers: &[S]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.as_ref().to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Short rows are padded with empty cells.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        debug_assert!(row.len() <= self.headers.len());
        row.resize(self.headers.len(), Cell::Empty);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Per-column width: longest header or value, plus `padding`.
    pub fn column_widths(&self, padding: usize) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(Cell::display_len)
                    .fold(header.chars().count(), usize::max);
                longest + padding
            })
            .collect()
    }
}
