//! Delivery personnel (`dr`) transformation.
//!
//! The subjects sheet carries one row per courier. The header is located by
//! the name column marker anywhere in the row; the municipality is derived
//! from the permanent-residence address with strict postal-code stripping.

use crate::error::{ProcessError, ProcessResult};
use crate::sheet::header::{locate_header, MarkerMatch, MarkerScope};
use crate::sheet::RawSheet;

use super::{append_municipality, data_rows, header_cells, CanonicalDataset};

/// Marker identifying the header row.
const HEADER_MARKER: &str = "Titul, meno a priezvisko";

/// Address-bearing column the municipality is derived from.
const ADDRESS_COLUMN: &str = "adresa trvalého pobytu";

pub fn process(subjects: &RawSheet) -> ProcessResult<CanonicalDataset> {
    let header_idx = locate_header(
        subjects,
        HEADER_MARKER,
        MarkerMatch::Contains,
        MarkerScope::Anywhere,
    )?;

    let mut header = header_cells(&subjects.rows[header_idx]);
    let mut rows = data_rows(subjects, header_idx + 1);

    append_municipality(&mut header, &mut rows, ADDRESS_COLUMN, false)?;

    if rows.is_empty() {
        return Err(ProcessError::EmptyResult);
    }

    Ok(CanonicalDataset { header, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agenda::MUNICIPALITY_COLUMN;
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
    fn test_municipality_appended() {
        let sheet = text_sheet(vec![
            vec!["Zoznam doručovateľov"],
            vec![
                "Por. č.",
                "Titul, meno a priezvisko",
                "rodné číslo",
                "adresa trvalého pobytu",
                "Obec",
            ],
            vec![
                "1",
                "Ján Novák",
                "9001011234",
                "Hlavná 1, 974 01 Banská Bystrica",
                "",
            ],
        ]);

        let dataset = process(&sheet).unwrap();
        assert_eq!(dataset.header.last().unwrap(), MUNICIPALITY_COLUMN);
        assert_eq!(dataset.rows.len(), 1);

        // The appended column shadows the blank source "Obec" column.
        let map = dataset.column_map();
        let obec = find_key(&map, "Obec").unwrap();
        assert_eq!(dataset.rows[0][obec].text(), "Banská Bystrica");
    }

    #[test]
    fn test_trailing_blank_rows_discarded() {
        let sheet = text_sheet(vec![
            vec!["Titul, meno a priezvisko", "adresa trvalého pobytu"],
            vec!["Ján Novák", "Hlavná 1, 974 01 Banská Bystrica"],
            vec!["", ""],
            vec!["", ""],
        ]);
        let dataset = process(&sheet).unwrap();
        assert_eq!(dataset.rows.len(), 1);
    }

    #[test]
    fn test_header_only_is_empty_result() {
        let sheet = text_sheet(vec![vec![
            "Titul, meno a priezvisko",
            "adresa trvalého pobytu",
        ]]);
        let err = process(&sheet).unwrap_err();
        assert!(matches!(err, ProcessError::EmptyResult));
    }

    #[test]
    fn test_missing_marker() {
        let sheet = text_sheet(vec![vec!["meno"], vec!["Ján"]]);
        let err = process(&sheet).unwrap_err();
        assert!(matches!(err, ProcessError::HeaderNotFound { .. }));
    }
}
