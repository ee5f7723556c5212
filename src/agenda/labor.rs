//! Labor duty (`pp`) transformation.
//!
//! The subjects sheet prefixes every row with an index/number column pair
//! that is discarded before use. The header marker must sit in the third
//! column exactly; a marker appearing elsewhere in a preamble row must not
//! be mistaken for the header.

use crate::error::{ProcessError, ProcessResult};
use crate::sheet::header::{locate_header, MarkerMatch, MarkerScope};
use crate::sheet::{RawSheet, Row};

use super::{append_municipality, data_rows, CanonicalDataset};

/// Marker identifying the header row; required in this exact column.
const HEADER_MARKER: &str = "Titul, meno a priezvisko";
const MARKER_COLUMN: usize = 2;

/// Number of leading columns (index + evidence number) dropped from the
/// header and every data row.
const DROPPED_COLUMNS: usize = 2;

/// Address-bearing column the municipality is derived from.
const ADDRESS_COLUMN: &str = "adresa trvalého pobytu";

pub fn process(subjects: &RawSheet) -> ProcessResult<CanonicalDataset> {
    let header_idx = locate_header(
        subjects,
        HEADER_MARKER,
        MarkerMatch::Contains,
        MarkerScope::Column(MARKER_COLUMN),
    )?;

    let mut header: Vec<String> = subjects.rows[header_idx]
        .iter()
        .skip(DROPPED_COLUMNS)
        .map(|c| c.text().trim().to_string())
        .collect();

    let mut rows: Vec<Row> = data_rows(subjects, header_idx + 1)
        .into_iter()
        .map(|row| row.into_iter().skip(DROPPED_COLUMNS).collect())
        .collect();

    append_municipality(&mut header, &mut rows, ADDRESS_COLUMN, false)?;

    if rows.is_empty() {
        return Err(ProcessError::EmptyResult);
    }

    Ok(CanonicalDataset { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::columns::find_key;
    use crate::sheet::Cell;

    fn text_sheet(rows: Vec<Vec<&str>>) -> RawSheet {
        RawSheet::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(|s| Cell::Text(s.to_string())).collect())
                .collect(),
        )
    }

    #[test]
    fn test_leading_columns_dropped() {
        let sheet = text_sheet(vec![
            // Preamble row mentioning the marker outside column 2 must be
            // skipped.
            vec!["Titul, meno a priezvisko", "", ""],
            vec![
                "P. č.",
                "Ev. číslo",
                "Titul, meno a priezvisko",
                "rodné číslo",
                "profesia",
                "adresa trvalého pobytu",
            ],
            vec![
                "1",
                "EV-001",
                "Mgr. Anna Veselá",
                "9155041234",
                "zdravotná sestra",
                "Lipová 3, 974 01 Banská Bystrica",
            ],
        ]);

        let dataset = process(&sheet).unwrap();
        assert_eq!(dataset.header[0], "Titul, meno a priezvisko");
        assert!(!dataset.header.contains(&"Ev. číslo".to_string()));

        let map = dataset.column_map();
        assert_eq!(dataset.rows[0][find_key(&map, "profesia").unwrap()].text(), "zdravotná sestra");
        assert_eq!(
            dataset.rows[0][find_key(&map, "Obec").unwrap()].text(),
            "Banská Bystrica"
        );
    }

    #[test]
    fn test_marker_outside_fixed_column_not_found() {
        let sheet = text_sheet(vec![
            vec!["Titul, meno a priezvisko", "x", "y"],
            vec!["1", "2", "3"],
        ]);
        assert!(matches!(
            process(&sheet).unwrap_err(),
            ProcessError::HeaderNotFound { .. }
        ));
    }
}
