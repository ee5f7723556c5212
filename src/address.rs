//! Municipality derivation from free-text addresses.
//!
//! Addresses arrive as one composite string, typically
//! `"Hlavná 5, 974 01 Banská Bystrica"`. The municipality is the last
//! comma-separated segment with the leading postal code stripped off.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bucket for rows whose address cannot be classified into a municipality.
pub const UNCLASSIFIED: &str = "Unclassified";

/// Leading postal code: 3 digits, optional space, 2 digits, required space.
static POSTAL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{3} ?\d{2} ").expect("postal prefix regex"));

/// Extract the municipality from a composite address.
///
/// Splits on comma; with fewer than two parts the address is
/// [`UNCLASSIFIED`]. Otherwise the last part is taken, the postal-code
/// prefix is stripped from its front, and the trimmed remainder is the
/// municipality even when stripping leaves it empty.
pub fn municipality(address: &str) -> String {
    match last_segment(address) {
        Some(segment) => strip_postal_prefix(&segment),
        None => UNCLASSIFIED.to_string(),
    }
}

/// Variant used by the lodging agenda: when stripping the postal prefix
/// leaves nothing usable, fall back to the whole last comma segment
/// unstripped. The other agendas always use the stripped remainder.
pub fn municipality_or_segment(address: &str) -> String {
    match last_segment(address) {
        Some(segment) => {
            let stripped = strip_postal_prefix(&segment);
            if stripped.is_empty() {
                segment.trim().to_string()
            } else {
                stripped
            }
        }
        None => UNCLASSIFIED.to_string(),
    }
}

/// Last comma segment with leading whitespace removed. Trailing whitespace
/// stays: the postal-prefix match needs the space after the code.
fn last_segment(address: &str) -> Option<String> {
    let parts: Vec<&str> = address.split(',').collect();
    if parts.len() < 2 {
        return None;
    }
    Some(parts[parts.len() - 1].trim_start().to_string())
}

fn strip_postal_prefix(segment: &str) -> String {
    POSTAL_PREFIX.replace(segment, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_municipality_with_postal_code() {
        assert_eq!(
            municipality("Hlavná 5, 974 01 Banská Bystrica"),
            "Banská Bystrica"
        );
    }

    #[test]
    fn test_municipality_postal_code_no_inner_space() {
        assert_eq!(municipality("Dlhá 12, 97401 Banská Bystrica"), "Banská Bystrica");
    }

    #[test]
    fn test_municipality_without_postal_code() {
        assert_eq!(municipality("Nám. SNP 1, Zvolen"), "Zvolen");
    }

    #[test]
    fn test_no_comma_is_unclassified() {
        assert_eq!(municipality("Hlavná 5"), UNCLASSIFIED);
        assert_eq!(municipality(""), UNCLASSIFIED);
    }

    #[test]
    fn test_stripped_remainder_may_be_empty() {
        // Last segment is only a postal code; the strict variant keeps the
        // empty remainder.
        assert_eq!(municipality("Hlavná 5, 974 01 "), "");
    }

    #[test]
    fn test_lodging_fallback_to_unstripped_segment() {
        assert_eq!(municipality_or_segment("Hlavná 5, 974 01 "), "974 01");
        assert_eq!(
            municipality_or_segment("Hlavná 5, 974 01 Banská Bystrica"),
            "Banská Bystrica"
        );
    }

    #[test]
    fn test_multiple_commas_takes_last() {
        assert_eq!(
            municipality("Blok B, Nová 3, 010 01 Žilina"),
            "Žilina"
        );
    }
}
