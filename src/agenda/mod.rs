//! Agenda transformations: raw uploaded sheets to canonical datasets.
//!
//! Each agenda variant owns its own header marker, column set and derived
//! columns. The common shape is shared here: locate the header row, trim
//! trailing blank rows, append the derived municipality column, and fail
//! loudly when the result carries no data.
//!
//! - [`supplier`] - supplier goods (`vp`), two-row header + postal lookup
//! - [`delivery`] - delivery personnel (`dr`)
//! - [`lodging`] - lodging (`ub`)
//! - [`labor`] - labor duty (`pp`)

pub mod delivery;
pub mod labor;
pub mod lodging;
pub mod supplier;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address;
use crate::error::{ProcessError, ProcessResult};
use crate::sheet::columns::{self, find_key, ColumnMap};
use crate::sheet::{trim_trailing_blank, Cell, RawSheet, Row};

/// Name of the derived municipality column appended by every variant.
pub const MUNICIPALITY_COLUMN: &str = "Obec";

// =============================================================================
// Agenda
// =============================================================================

/// One of the four administrative workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Agenda {
    /// Supplier goods ("vecné plnenie").
    Vp,
    /// Delivery personnel ("doručovatelia").
    Dr,
    /// Lodging ("ubytovanie").
    Ub,
    /// Labor duty ("pracovná povinnosť").
    Pp,
}

impl Agenda {
    /// All agendas in UI order.
    pub const ALL: [Agenda; 4] = [Agenda::Vp, Agenda::Dr, Agenda::Ub, Agenda::Pp];

    /// Parse the short agenda key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "vp" => Some(Agenda::Vp),
            "dr" => Some(Agenda::Dr),
            "ub" => Some(Agenda::Ub),
            "pp" => Some(Agenda::Pp),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Agenda::Vp => "vp",
            Agenda::Dr => "dr",
            Agenda::Ub => "ub",
            Agenda::Pp => "pp",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Agenda::Vp => "Dodávka tovarov",
            Agenda::Dr => "Doručovatelia",
            Agenda::Ub => "Ubytovanie",
            Agenda::Pp => "Pracovná povinnosť",
        }
    }

    /// Input slots that must be filled before transformation runs.
    pub fn required_slots(&self) -> &'static [Slot] {
        match self {
            Agenda::Vp => &[Slot::Subjects, Slot::PostalReference],
            _ => &[Slot::Subjects],
        }
    }

    /// Whether generation requires a saved case number for this agenda.
    pub fn requires_case_number(&self) -> bool {
        true
    }
}

impl fmt::Display for Agenda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

// =============================================================================
// Input Slots
// =============================================================================

/// Logical upload slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    /// The subjects sheet every agenda requires.
    Subjects,
    /// The postal reference table (supplier goods only).
    PostalReference,
}

impl Slot {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_lowercase().as_str() {
            "subjects" => Some(Slot::Subjects),
            "postal-reference" => Some(Slot::PostalReference),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Slot::Subjects => "subjects",
            Slot::PostalReference => "postal-reference",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Uploaded raw inputs keyed by logical slot.
pub type SlotInputs = HashMap<Slot, Vec<u8>>;

// =============================================================================
// Canonical Dataset
// =============================================================================

/// The transformed tabular dataset: canonical header plus cleaned rows.
///
/// Invariant: every row has exactly `header.len()` cells and at least one
/// data row exists.
#[derive(Debug, Clone)]
pub struct CanonicalDataset {
    pub header: Vec<String>,
    pub rows: Vec<Row>,
}

impl CanonicalDataset {
    /// Column map over the canonical header. With a duplicate header name
    /// the later column wins, so the appended municipality column shadows a
    /// pre-existing blank one.
    pub fn column_map(&self) -> ColumnMap {
        columns::column_map(&self.header)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Transform the uploaded inputs for one agenda into a canonical dataset.
///
/// Fails with [`ProcessError::MissingInput`] when a required slot is empty,
/// and with the variant-specific errors otherwise. No side effects beyond
/// allocation.
pub fn process(agenda: Agenda, inputs: &SlotInputs) -> ProcessResult<CanonicalDataset> {
    for slot in agenda.required_slots() {
        if !inputs.contains_key(slot) {
            return Err(ProcessError::MissingInput(slot.key().to_string()));
        }
    }

    let subjects = RawSheet::decode(&inputs[&Slot::Subjects])?;
    match agenda {
        Agenda::Vp => {
            let postal = RawSheet::decode(&inputs[&Slot::PostalReference])?;
            supplier::process(&subjects, &postal)
        }
        Agenda::Dr => delivery::process(&subjects),
        Agenda::Ub => lodging::process(&subjects),
        Agenda::Pp => labor::process(&subjects),
    }
}

// =============================================================================
// Shared Helpers
// =============================================================================

/// Trimmed textual header cells of one row.
pub(crate) fn header_cells(row: &Row) -> Vec<String> {
    row.iter().map(|c| c.text().trim().to_string()).collect()
}

/// Data rows starting at `first`, with the trailing all-blank run discarded.
pub(crate) fn data_rows(sheet: &RawSheet, first: usize) -> Vec<Row> {
    let mut rows: Vec<Row> = sheet.rows.iter().skip(first).cloned().collect();
    trim_trailing_blank(&mut rows);
    rows
}

/// Append the derived municipality column: resolve the address-bearing
/// source column via tolerant lookup, compute the municipality per row and
/// push it as a new trailing cell, then extend the header.
///
/// `lodging_fallback` selects the lodging variant's derivation, which falls
/// back to the unstripped last address segment when postal-code stripping
/// yields nothing.
pub(crate) fn append_municipality(
    header: &mut Vec<String>,
    rows: &mut [Row],
    source_column: &str,
    lodging_fallback: bool,
) -> ProcessResult<()> {
    let map = columns::column_map(header);
    let addr_idx = find_key(&map, source_column)
        .ok_or_else(|| ProcessError::ColumnNotFound(source_column.to_string()))?;

    let width = header.len();
    for row in rows.iter_mut() {
        crate::sheet::resize_row(row, width);
        let addr = row[addr_idx].text();
        let town = if lodging_fallback {
            address::municipality_or_segment(&addr)
        } else {
            address::municipality(&addr)
        };
        row.push(Cell::Text(town));
    }
    header.push(MUNICIPALITY_COLUMN.to_string());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agenda_key_roundtrip() {
        for agenda in Agenda::ALL {
            assert_eq!(Agenda::from_key(agenda.key()), Some(agenda));
        }
        assert_eq!(Agenda::from_key("xx"), None);
    }

    #[test]
    fn test_required_slots() {
        assert_eq!(Agenda::Vp.required_slots().len(), 2);
        assert_eq!(Agenda::Dr.required_slots(), &[Slot::Subjects]);
    }

    #[test]
    fn test_missing_input_names_slot() {
        let inputs = SlotInputs::new();
        let err = process(Agenda::Dr, &inputs).unwrap_err();
        assert!(err.to_string().contains("subjects"));
    }

    #[test]
    fn test_vp_missing_postal_reference() {
        let mut inputs = SlotInputs::new();
        inputs.insert(Slot::Subjects, vec![1, 2, 3]);
        let err = process(Agenda::Vp, &inputs).unwrap_err();
        assert!(err.to_string().contains("postal-reference"));
    }

    #[test]
    fn test_append_municipality() {
        let mut header = vec!["meno".to_string(), "adresa trvalého pobytu".to_string()];
        let mut rows = vec![vec![
            Cell::Text("Ján".into()),
            Cell::Text("Hlavná 5, 974 01 Banská Bystrica".into()),
        ]];
        append_municipality(&mut header, &mut rows, "adresa trvalého pobytu", false).unwrap();
        assert_eq!(header.last().unwrap(), MUNICIPALITY_COLUMN);
        assert_eq!(rows[0].last().unwrap().text(), "Banská Bystrica");
    }

    #[test]
    fn test_append_municipality_missing_column() {
        let mut header = vec!["meno".to_string()];
        let mut rows = vec![vec![Cell::Text("Ján".into())]];
        let err =
            append_municipality(&mut header, &mut rows, "adresa", false).unwrap_err();
        assert!(matches!(err, ProcessError::ColumnNotFound(_)));
    }
}
