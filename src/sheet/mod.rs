//! Spreadsheet decoding and raw sheet primitives.
//!
//! Converts uploaded workbook bytes into a [`RawSheet`]: an ordered sequence
//! of rows of scalar [`Cell`] values. A sheet is immutable once decoded; all
//! downstream cleaning (header location, trailing-blank trimming) works on
//! copies of its rows.

pub mod columns;
pub mod header;

use std::fmt;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};

use crate::error::{SheetError, SheetResult};

/// A single scalar cell value.
///
/// Spreadsheet decoders hand numbers back as real numbers, not text, so a
/// zero house number arrives as `Number(0.0)` rather than `"0"`. Validation
/// and binding must go through [`Cell::text`] / [`Cell::is_zero`] instead of
/// assuming strings.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    /// Stringified value. Whole numbers print without a decimal point,
    /// matching how the cells appear in the source sheet.
    pub fn text(&self) -> String {
        self.to_string()
    }

    /// A cell is blank when its stringified, trimmed form is empty.
    pub fn is_blank(&self) -> bool {
        self.to_string().trim().is_empty()
    }

    /// True for numeric zero and the textual forms `"0"` / `"0.0"`.
    pub fn is_zero(&self) -> bool {
        match self {
            Cell::Number(n) => *n == 0.0,
            Cell::Text(s) => matches!(s.trim(), "0" | "0.0"),
            Cell::Empty => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
        }
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// One row of cells.
pub type Row = Vec<Cell>;

/// An ordered sequence of rows decoded from one worksheet.
#[derive(Debug, Clone)]
pub struct RawSheet {
    pub rows: Vec<Row>,
}

impl RawSheet {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Decode the first worksheet of an xlsx workbook.
    pub fn decode(bytes: &[u8]) -> SheetResult<Self> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
            .map_err(|e: calamine::XlsxError| SheetError::Workbook(e.to_string()))?;

        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or(SheetError::NoWorksheet)?;

        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| SheetError::Workbook(e.to_string()))?;

        let rows = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();

        Ok(Self { rows })
    }
}

/// A row counts as non-blank if any cell, stringified and trimmed, is
/// non-empty.
pub fn row_is_blank(row: &Row) -> bool {
    row.iter().all(Cell::is_blank)
}

/// Discard rows after the last non-blank row. Interior blank rows between
/// two non-blank rows are preserved; only the trailing run is dropped.
pub fn trim_trailing_blank(rows: &mut Vec<Row>) {
    let last_non_blank = rows.iter().rposition(|r| !row_is_blank(r));
    match last_non_blank {
        Some(idx) => rows.truncate(idx + 1),
        None => rows.clear(),
    }
}

/// Pad or truncate a row to exactly `len` cells.
pub fn resize_row(row: &mut Row, len: usize) {
    row.resize(len, Cell::Empty);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    #[test]
    fn test_cell_display_whole_number() {
        assert_eq!(Cell::Number(42.0).text(), "42");
        assert_eq!(Cell::Number(3.5).text(), "3.5");
        assert_eq!(Cell::Empty.text(), "");
    }

    #[test]
    fn test_cell_is_zero() {
        assert!(Cell::Number(0.0).is_zero());
        assert!(t("0").is_zero());
        assert!(t("0.0").is_zero());
        assert!(t(" 0 ").is_zero());
        assert!(!t("").is_zero());
        assert!(!Cell::Empty.is_zero());
        assert!(!t("5").is_zero());
    }

    #[test]
    fn test_row_is_blank() {
        assert!(row_is_blank(&vec![Cell::Empty, t("  "), t("")]));
        assert!(!row_is_blank(&vec![Cell::Empty, t("x")]));
        assert!(!row_is_blank(&vec![Cell::Number(0.0)]));
    }

    #[test]
    fn test_trim_trailing_blank_keeps_interior() {
        let mut rows = vec![
            vec![t("a")],
            vec![t("")],
            vec![t("b")],
            vec![Cell::Empty],
            vec![t("  ")],
        ];
        trim_trailing_blank(&mut rows);
        assert_eq!(rows.len(), 3);
        assert!(row_is_blank(&rows[1]));
    }

    #[test]
    fn test_trim_trailing_blank_all_blank() {
        let mut rows = vec![vec![Cell::Empty], vec![t(" ")]];
        trim_trailing_blank(&mut rows);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = RawSheet::decode(b"definitely not a workbook");
        assert!(result.is_err());
    }
}
