//! Header row location by fuzzy marker matching.
//!
//! Uploaded sheets carry preamble rows (titles, office names, blank
//! separators) above the real header. The header is found by scanning for a
//! known marker cell; each agenda configures its own marker string, match
//! kind, and whether the marker may appear anywhere in the row or must sit
//! in a fixed column.

use crate::error::{ProcessError, ProcessResult};
use crate::sheet::RawSheet;

/// How a cell is compared against the marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerMatch {
    /// Normalized forms must be equal.
    Exact,
    /// Normalized cell must contain the normalized marker.
    Contains,
}

/// Where in a row the marker is allowed to appear.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarkerScope {
    /// Any cell of the row.
    Anywhere,
    /// Only the cell at this zero-based column index.
    Column(usize),
}

/// Normalization applied to both sides before comparison: trim surrounding
/// whitespace, case-fold, collapse internal whitespace runs to one space.
fn normalize(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn cell_matches(cell_text: &str, marker: &str, kind: MarkerMatch) -> bool {
    let cell = normalize(cell_text);
    let marker = normalize(marker);
    if marker.is_empty() {
        return false;
    }
    match kind {
        MarkerMatch::Exact => cell == marker,
        MarkerMatch::Contains => cell.contains(&marker),
    }
}

/// Return the zero-based index of the first row satisfying the marker
/// predicate, or [`ProcessError::HeaderNotFound`] naming the marker sought.
pub fn locate_header(
    sheet: &RawSheet,
    marker: &str,
    kind: MarkerMatch,
    scope: MarkerScope,
) -> ProcessResult<usize> {
    for (idx, row) in sheet.rows.iter().enumerate() {
        let hit = match scope {
            MarkerScope::Anywhere => row
                .iter()
                .any(|cell| cell_matches(&cell.text(), marker, kind)),
            MarkerScope::Column(col) => row
                .get(col)
                .is_some_and(|cell| cell_matches(&cell.text(), marker, kind)),
        };
        if hit {
            return Ok(idx);
        }
    }

    Err(ProcessError::HeaderNotFound {
        marker: marker.to_string(),
    })
}
