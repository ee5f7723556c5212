//! Supplier goods (`vp`) transformation.
//!
//! The subjects sheet carries a two-row-tall header block: a main header row
//! and an immediately following sub-header row (the delivery columns sit
//! under one merged main cell). The output is a fixed, explicit order of 15
//! named columns; each source column is looked up independently in the main
//! or sub header. Rows whose sequence column is empty are skipped, and each
//! row's municipality is cross-referenced against the postal reference table
//! to fill the combined "PSČ a dodacia pošta" column.

use std::collections::HashMap;

use crate::address;
use crate::error::{ProcessError, ProcessResult};
use crate::sheet::columns::{column_map_from_row, find_key, ColumnMap};
use crate::sheet::header::{locate_header, MarkerMatch, MarkerScope};
use crate::sheet::{Cell, RawSheet, Row};

use super::{data_rows, CanonicalDataset};

/// Marker identifying the main header row.
const HEADER_MARKER: &str = "Názov dodávateľa";

/// Marker identifying the header row of the postal reference table.
const POSTAL_MARKER: &str = "Obec";

/// Canonical output column order.
const OUTPUT_HEADER: [&str; 15] = [
    "Por. čís.",
    "Názov dodávateľa",
    "IČO",
    "Sídlo dodávateľa",
    "Druh tovaru",
    "Merná jednotka",
    "Množstvo",
    "Deň dodania",
    "Miesto dodania",
    "Kód trasy",
    "Skrátený kód trasy",
    "EČV vozidla",
    "Obec",
    "PSČ a dodacia pošta",
    "Poznámka",
];

// =============================================================================
// Postal Lookup
// =============================================================================

/// One entry of the postal reference table.
#[derive(Debug, Clone)]
pub struct PostalEntry {
    pub postal_code: String,
    pub post_office: String,
}

/// Mapping from uppercased municipality name to its postal code and
/// delivery post office. Read-only during dataset construction.
#[derive(Debug, Clone, Default)]
pub struct PostalLookup {
    entries: HashMap<String, PostalEntry>,
}

impl PostalLookup {
    /// Build the lookup from the postal reference sheet.
    pub fn from_sheet(sheet: &RawSheet) -> ProcessResult<Self> {
        let header_idx = locate_header(
            sheet,
            POSTAL_MARKER,
            MarkerMatch::Exact,
            MarkerScope::Anywhere,
        )?;
        let map = column_map_from_row(&sheet.rows[header_idx]);
        let obec = require(&map, "Obec")?;
        let psc = require(&map, "PSČ")?;
        let posta = require(&map, "Dodacia pošta")?;

        let mut entries = HashMap::new();
        for row in data_rows(sheet, header_idx + 1) {
            let name = cell_text(&row, obec);
            if name.is_empty() {
                continue;
            }
            entries.insert(
                name.to_uppercase(),
                PostalEntry {
                    postal_code: cell_text(&row, psc),
                    post_office: cell_text(&row, posta),
                },
            );
        }
        Ok(Self { entries })
    }

    /// Case-insensitive lookup by municipality name.
    pub fn get(&self, municipality: &str) -> Option<&PostalEntry> {
        self.entries.get(&municipality.trim().to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Transformation
// =============================================================================

pub fn process(subjects: &RawSheet, postal: &RawSheet) -> ProcessResult<CanonicalDataset> {
    let main_idx = locate_header(
        subjects,
        HEADER_MARKER,
        MarkerMatch::Contains,
        MarkerScope::Anywhere,
    )?;

    let main_map = column_map_from_row(&subjects.rows[main_idx]);
    let sub_map = subjects
        .rows
        .get(main_idx + 1)
        .map(column_map_from_row)
        .unwrap_or_default();

    // Source columns, each resolved in its own header row.
    let seq = require(&main_map, "Por. čís.")?;
    let name = require(&main_map, "Názov dodávateľa")?;
    let ico = require(&main_map, "IČO")?;
    let seat = require(&main_map, "Sídlo dodávateľa")?;
    let goods = require(&sub_map, "Druh tovaru")?;
    let unit = require(&sub_map, "Merná jednotka")?;
    let amount = require(&sub_map, "Množstvo")?;
    let day = require(&sub_map, "Deň dodania")?;
    let place = require(&main_map, "Miesto dodania")?;
    let route = require(&main_map, "Kód trasy")?;
    let plate = require(&main_map, "EČV vozidla")?;
    // Genuinely optional; older sheets do not carry it.
    let note = find_key(&main_map, "Poznámka");

    let lookup = PostalLookup::from_sheet(postal)?;

    let mut rows: Vec<Row> = Vec::new();
    for row in data_rows(subjects, main_idx + 2) {
        // Continuation and summary rows have no sequence number.
        if row.get(seq).map_or(true, Cell::is_blank) {
            continue;
        }

        let route_code = cell_text(&row, route);
        let municipality = address::municipality(&cell_text(&row, seat));
        let postal_combo = lookup
            .get(&municipality)
            .map(|e| format!("{} {}", e.postal_code, e.post_office))
            .unwrap_or_default();

        rows.push(vec![
            row[seq].clone(),
            text_cell(&row, name),
            text_cell(&row, ico),
            text_cell(&row, seat),
            text_cell(&row, goods),
            text_cell(&row, unit),
            // Quantity keeps its decoded cell so numeric zero survives as a
            // number for the presence-or-zero check.
            row.get(amount).cloned().unwrap_or(Cell::Empty),
            text_cell(&row, day),
            text_cell(&row, place),
            Cell::Text(route_code.clone()),
            Cell::Text(short_route_code(&route_code)),
            text_cell(&row, plate),
            Cell::Text(municipality),
            Cell::Text(postal_combo),
            note.map_or(Cell::Empty, |idx| text_cell(&row, idx)),
        ]);
    }

    if rows.is_empty() {
        return Err(ProcessError::EmptyResult);
    }

    Ok(CanonicalDataset {
        header: OUTPUT_HEADER.iter().map(|s| s.to_string()).collect(),
        rows,
    })
}

/// Text before the first hyphen of a route code, or the raw value when no
/// hyphen is present.
pub fn short_route_code(route: &str) -> String {
    match route.split_once('-') {
        Some((head, _)) => head.trim().to_string(),
        None => route.trim().to_string(),
    }
}

fn require(map: &ColumnMap, name: &str) -> ProcessResult<usize> {
    find_key(map, name).ok_or_else(|| ProcessError::ColumnNotFound(name.to_string()))
}

fn cell_text(row: &Row, idx: usize) -> String {
    row.get(idx).map(|c| c.text().trim().to_string()).unwrap_or_default()
}

fn text_cell(row: &Row, idx: usize) -> Cell {
    Cell::Text(cell_text(row, idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::columns;

    fn text_sheet(rows: Vec<Vec<&str>>) -> RawSheet {
        RawSheet::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(|s| Cell::Text(s.to_string())).collect())
                .collect(),
        )
    }

    fn postal_sheet() -> RawSheet {
        text_sheet(vec![
            vec!["Obec", "PSČ", "Dodacia pošta"],
            vec!["Banská Bystrica", "974 01", "Banská Bystrica 1"],
            vec!["Zvolen", "960 01", "Zvolen 1"],
        ])
    }

    fn subjects_sheet() -> RawSheet {
        text_sheet(vec![
            vec!["Prehľad dodávateľov"],
            vec![
                "Por. čís.",
                "Názov dodávateľa",
                "IČO",
                "Sídlo dodávateľa",
                "Dodávka",
                "",
                "",
                "",
                "Miesto dodania",
                "Kód trasy",
                "EČV vozidla",
                "Poznámka",
            ],
            vec![
                "",
                "",
                "",
                "",
                "Druh tovaru",
                "Merná jednotka",
                "Množstvo",
                "Deň dodania",
                "",
                "",
                "",
                "",
            ],
            vec![
                "1",
                "Pekáreň s.r.o.",
                "12345678",
                "Mlynská 4, 974 01 Banská Bystrica",
                "chlieb",
                "ks",
                "200",
                "pondelok",
                "sklad A",
                "BB-12",
                "BB123XY",
                "",
            ],
            // Continuation row without a sequence number is skipped.
            vec![
                "",
                "",
                "",
                "",
                "rožky",
                "ks",
                "500",
                "utorok",
                "",
                "",
                "",
                "",
            ],
        ])
    }

    #[test]
    fn test_fixed_output_order() {
        let dataset = process(&subjects_sheet(), &postal_sheet()).unwrap();
        assert_eq!(dataset.header.len(), 15);
        assert_eq!(dataset.header[0], "Por. čís.");
        assert_eq!(dataset.header[13], "PSČ a dodacia pošta");
        assert_eq!(dataset.rows.len(), 1);
    }

    #[test]
    fn test_postal_cross_reference() {
        let dataset = process(&subjects_sheet(), &postal_sheet()).unwrap();
        let map = columns::column_map(&dataset.header);
        let idx = find_key(&map, "PSČ a dodacia pošta").unwrap();
        assert_eq!(dataset.rows[0][idx].text(), "974 01 Banská Bystrica 1");
    }

    #[test]
    fn test_short_route_code() {
        assert_eq!(short_route_code("BB-12"), "BB");
        assert_eq!(short_route_code("BB12"), "BB12");
        assert_eq!(short_route_code(""), "");

        let dataset = process(&subjects_sheet(), &postal_sheet()).unwrap();
        let map = columns::column_map(&dataset.header);
        let idx = find_key(&map, "Skrátený kód trasy").unwrap();
        assert_eq!(dataset.rows[0][idx].text(), "BB");
    }

    #[test]
    fn test_unknown_municipality_empty_postal() {
        let subjects = text_sheet(vec![
            vec![
                "Por. čís.",
                "Názov dodávateľa",
                "IČO",
                "Sídlo dodávateľa",
                "x",
                "Miesto dodania",
                "Kód trasy",
                "EČV vozidla",
            ],
            vec![
                "", "", "", "", "Druh tovaru", "Merná jednotka", "Množstvo", "Deň dodania",
            ],
            vec![
                "1",
                "Firma",
                "87654321",
                "Ulica 1, 999 99 Neznáma Obec",
                "voda",
                "l",
                "10",
                "streda",
            ],
        ]);
        let dataset = process(&subjects, &postal_sheet()).unwrap();
        let map = columns::column_map(&dataset.header);
        let idx = find_key(&map, "PSČ a dodacia pošta").unwrap();
        assert_eq!(dataset.rows[0][idx].text(), "");
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let lookup = PostalLookup::from_sheet(&postal_sheet()).unwrap();
        assert!(lookup.get("BANSKÁ BYSTRICA").is_some());
        assert!(lookup.get("banská bystrica").is_some());
        assert!(lookup.get("Martin").is_none());
    }
}
