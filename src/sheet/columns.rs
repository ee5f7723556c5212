//! Column name to index mapping with tolerant lookup.
//!
//! Real input headers drift along three axes: surrounding whitespace, case,
//! and punctuation. [`find_key`] normalizes both sides before comparing, so
//! `"  IČO  "` in a header matches a lookup for `"IČO"` and
//! `"Adresa   Trvalého  Pobytu"` matches `"adresa trvalého pobytu"`.
//! Absence of a column is `None`, not an error: some columns are genuinely
//! optional per agenda and callers decide what absence means.

use std::collections::HashMap;

use crate::sheet::Row;

/// Mapping from trimmed header name to zero-based column index.
///
/// Built by [`column_map`]; when the same trimmed name appears twice the
/// later column wins, so an appended derived column shadows a pre-existing
/// blank one of the same name.
pub type ColumnMap = HashMap<String, usize>;

/// Build a [`ColumnMap`] from a header row of names.
pub fn column_map(header: &[String]) -> ColumnMap {
    let mut map = ColumnMap::new();
    for (idx, name) in header.iter().enumerate() {
        map.insert(name.trim().to_string(), idx);
    }
    map
}

/// Build a [`ColumnMap`] directly from a row of cells.
pub fn column_map_from_row(row: &Row) -> ColumnMap {
    let names: Vec<String> = row.iter().map(|c| c.text().trim().to_string()).collect();
    column_map(&names)
}

/// Normalize a header name for comparison: trim, lowercase, replace any run
/// of non-alphanumeric / non-space characters with a single space, collapse
/// repeated spaces.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_space = true;
    for ch in name.trim().to_lowercase().chars() {
        if ch.is_alphanumeric() {
            out.push(ch);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Tolerant lookup: compare normalized forms first, fall back to literal
/// trimmed equality, otherwise the column is absent.
pub fn find_key(map: &ColumnMap, name: &str) -> Option<usize> {
    let wanted = normalize_name(name);
    if !wanted.is_empty() {
        if let Some(idx) = map
            .iter()
            .find(|(key, _)| normalize_name(key) == wanted)
            .map(|(_, idx)| *idx)
        {
            return Some(idx);
        }
    }
    map.get(name.trim()).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_of(names: &[&str]) -> ColumnMap {
        column_map(&names.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn test_find_key_trims_header() {
        let map = map_of(&["  IČO  ", "Názov"]);
        assert_eq!(find_key(&map, "IČO"), Some(0));
    }

    #[test]
    fn test_find_key_case_and_space_insensitive() {
        let map = map_of(&["Adresa   Trvalého  Pobytu"]);
        assert_eq!(find_key(&map, "adresa trvalého pobytu"), Some(0));
    }

    #[test]
    fn test_find_key_punctuation_insensitive() {
        let map = map_of(&["Por. č."]);
        assert_eq!(find_key(&map, "Por č"), Some(0));
    }

    #[test]
    fn test_find_key_absent_is_none() {
        let map = map_of(&["Obec"]);
        assert_eq!(find_key(&map, "Ulica"), None);
    }

    #[test]
    fn test_duplicate_name_later_column_wins() {
        let map = map_of(&["Obec", "x", "Obec"]);
        assert_eq!(find_key(&map, "Obec"), Some(2));
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Por.  č. "), "por č");
        assert_eq!(normalize_name("rodné číslo"), "rodné číslo");
    }
}
