//! Lodging (`ub`) transformation.
//!
//! One row per lodging facility. The header is located by the personal-id
//! column marker; the municipality is derived from the facility address.
//! Unlike the other agendas, when postal-code stripping leaves nothing
//! usable the derivation falls back to the whole unstripped address segment.

use crate::error::{ProcessError, ProcessResult};
use crate::sheet::header::{locate_header, MarkerMatch, MarkerScope};
use crate::sheet::RawSheet;

use super::{append_municipality, data_rows, header_cells, CanonicalDataset};

/// Marker identifying the header row.
const HEADER_MARKER: &str = "rodné číslo";

/// Address-bearing column the municipality is derived from.
const ADDRESS_COLUMN: &str = "adresa objektu";

pub fn process(subjects: &RawSheet) -> ProcessResult<CanonicalDataset> {
    let header_idx = locate_header(
        subjects,
        HEADER_MARKER,
        MarkerMatch::Contains,
        MarkerScope::Anywhere,
    )?;

    let mut header = header_cells(&subjects.rows[header_idx]);
    let mut rows = data_rows(subjects, header_idx + 1);

    append_municipality(&mut header, &mut rows, ADDRESS_COLUMN, true)?;

    if rows.is_empty() {
        return Err(ProcessError::EmptyResult);
    }

    Ok(CanonicalDataset { header, rows })
}
