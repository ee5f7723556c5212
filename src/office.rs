//! Static reference table of district offices.
//!
//! Office address and contact fields are interpolated into every generated
//! document. The table is configuration, not runtime state.

use serde::Serialize;

/// One administrative district office.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Office {
    /// Stable key used by the UI and the session store.
    pub key: &'static str,
    /// Full office name as printed in documents.
    pub name: &'static str,
    /// Street address line.
    pub address: &'static str,
    /// Postal code and city line.
    pub postal_line: &'static str,
    /// Contact phone number.
    pub phone: &'static str,
}

/// All known district offices.
pub const OFFICES: &[Office] = &[
    Office {
        key: "bb",
        name: "Okresný úrad Banská Bystrica",
        address: "Nám. Ľ. Štúra 1",
        postal_line: "974 05 Banská Bystrica",
        phone: "048/430 61 11",
    },
    Office {
        key: "ba",
        name: "Okresný úrad Bratislava",
        address: "Tomášikova 46",
        postal_line: "832 05 Bratislava",
        phone: "02/491 96 111",
    },
    Office {
        key: "ke",
        name: "Okresný úrad Košice",
        address: "Komenského 52",
        postal_line: "041 26 Košice",
        phone: "055/600 11 00",
    },
    Office {
        key: "za",
        name: "Okresný úrad Žilina",
        address: "Vysokoškolákov 8556/33B",
        postal_line: "010 08 Žilina",
        phone: "041/733 55 71",
    },
    Office {
        key: "po",
        name: "Okresný úrad Prešov",
        address: "Námestie mieru 3",
        postal_line: "080 01 Prešov",
        phone: "051/708 21 11",
    },
    Office {
        key: "nr",
        name: "Okresný úrad Nitra",
        address: "Štefánikova trieda 69",
        postal_line: "949 01 Nitra",
        phone: "037/654 93 01",
    },
    Office {
        key: "tt",
        name: "Okresný úrad Trnava",
        address: "Kollárova 8",
        postal_line: "917 02 Trnava",
        phone: "033/556 41 11",
    },
    Office {
        key: "tn",
        name: "Okresný úrad Trenčín",
        address: "Hviezdoslavova 3",
        postal_line: "911 01 Trenčín",
        phone: "032/741 12 11",
    },
];

/// Look up an office by its key.
pub fn find_office(key: &str) -> Option<&'static Office> {
    OFFICES.iter().find(|o| o.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_office() {
        let office = find_office("bb").unwrap();
        assert!(office.name.contains("Banská Bystrica"));
        assert!(find_office("xx").is_none());
    }

    #[test]
    fn test_keys_unique() {
        let mut keys: Vec<_> = OFFICES.iter().map(|o| o.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), OFFICES.len());
    }
}
