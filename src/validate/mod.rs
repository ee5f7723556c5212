//! Per-row validation against agenda-specific business rules.
//!
//! [`validate`] is a pure function: given an agenda key, one canonical row
//! and the dataset's column map it returns human-readable error messages,
//! one per failing rule, in the fixed order the rules are declared in. An
//! empty list means the row is valid. Unknown agenda keys have no rules
//! defined and yield an empty list.

use crate::agenda::Agenda;
use crate::sheet::columns::{find_key, ColumnMap};
use crate::sheet::{Cell, Row};

/// Run the fixed rule battery for one agenda over one row.
pub fn validate(agenda_key: &str, row: &Row, map: &ColumnMap) -> Vec<String> {
    let rules: &[Rule] = match Agenda::from_key(agenda_key) {
        Some(Agenda::Vp) => VP_RULES,
        Some(Agenda::Dr) => DR_RULES,
        Some(Agenda::Ub) => UB_RULES,
        Some(Agenda::Pp) => PP_RULES,
        // No rules defined for this agenda.
        None => &[],
    };

    let mut errors = Vec::new();
    for rule in rules {
        if let Some(message) = rule.check(row, map) {
            errors.push(message);
        }
    }
    errors
}

// =============================================================================
// Rules
// =============================================================================

/// One named field check.
#[derive(Debug, Clone, Copy)]
enum Rule {
    /// Field must be non-empty.
    Present(&'static str),
    /// Field must be non-empty or equal to zero; zero is a legitimate value
    /// (house numbers, vehicle plates) and must not be flagged.
    PresentOrZero(&'static str),
    /// National-id-or-business-id field: after stripping non-digits the
    /// length must be exactly 8 (IČO) or 9-10 (rodné číslo).
    Identifier(&'static str),
}

impl Rule {
    fn check(&self, row: &Row, map: &ColumnMap) -> Option<String> {
        match self {
            Rule::Present(name) => {
                if cell(row, map, name).map_or(true, Cell::is_blank) {
                    Some(missing(name))
                } else {
                    None
                }
            }
            Rule::PresentOrZero(name) => {
                // Zero must be recognized before the emptiness check: the
                // spreadsheet decoder hands zero back as a real number.
                match cell(row, map, name) {
                    Some(c) if c.is_zero() => None,
                    Some(c) if !c.is_blank() => None,
                    _ => Some(missing(name)),
                }
            }
            Rule::Identifier(name) => {
                let digits: String = cell(row, map, name)
                    .map(|c| c.text())
                    .unwrap_or_default()
                    .chars()
                    .filter(char::is_ascii_digit)
                    .collect();
                match digits.len() {
                    8..=10 => None,
                    _ => Some(format!(
                        "Stĺpec „{}“: identifikátor musí mať 8 číslic (IČO) alebo 9 až 10 číslic (rodné číslo).",
                        name
                    )),
                }
            }
        }
    }
}

fn missing(name: &str) -> String {
    format!("Chýba hodnota v stĺpci „{}“.", name)
}

fn cell<'a>(row: &'a Row, map: &ColumnMap, name: &str) -> Option<&'a Cell> {
    find_key(map, name).and_then(|idx| row.get(idx))
}

// Rule batteries, in the order errors are reported.

const VP_RULES: &[Rule] = &[
    Rule::Identifier("IČO"),
    Rule::Present("Názov dodávateľa"),
    Rule::Present("Sídlo dodávateľa"),
    Rule::Present("Druh tovaru"),
    Rule::PresentOrZero("Množstvo"),
    Rule::PresentOrZero("EČV vozidla"),
    Rule::Present("Obec"),
];

const DR_RULES: &[Rule] = &[
    Rule::Identifier("rodné číslo"),
    Rule::Present("Titul, meno a priezvisko"),
    Rule::Present("adresa trvalého pobytu"),
    Rule::Present("Obec"),
];

const UB_RULES: &[Rule] = &[
    Rule::Present("Titul, meno a priezvisko"),
    Rule::Identifier("rodné číslo"),
    Rule::Present("adresa objektu"),
    Rule::PresentOrZero("číslo domu"),
    Rule::Present("Obec"),
];

const PP_RULES: &[Rule] = &[
    Rule::Identifier("rodné číslo"),
    Rule::Present("Titul, meno a priezvisko"),
    Rule::Present("profesia"),
    Rule::Present("adresa trvalého pobytu"),
    Rule::Present("Obec"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::columns::column_map;

    fn map_of(names: &[&str]) -> ColumnMap {
        column_map(&names.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn dr_map() -> ColumnMap {
        map_of(&[
            "rodné číslo",
            "Titul, meno a priezvisko",
            "adresa trvalého pobytu",
            "Obec",
        ])
    }

    fn valid_dr_row() -> Row {
        vec![
            t("9001011234"),
            t("Ján Novák"),
            t("Hlavná 1, 974 01 Banská Bystrica"),
            t("Banská Bystrica"),
        ]
    }

    #[test]
    fn test_valid_row_no_errors() {
        assert!(validate("dr", &valid_dr_row(), &dr_map()).is_empty());
    }

    #[test]
    fn test_unknown_agenda_no_rules() {
        assert!(validate("zz", &valid_dr_row(), &dr_map()).is_empty());
    }

    #[test]
    fn test_missing_fields_exact_order() {
        let row = vec![t("9001011234"), t(""), t(""), t("Banská Bystrica")];
        let errors = validate("dr", &row, &dr_map());
        assert_eq!(
            errors,
            vec![
                "Chýba hodnota v stĺpci „Titul, meno a priezvisko“.",
                "Chýba hodnota v stĺpci „adresa trvalého pobytu“.",
            ]
        );
    }

    #[test]
    fn test_identifier_lengths() {
        let map = dr_map();
        let with_id = |id: &str| {
            let mut row = valid_dr_row();
            row[0] = t(id);
            validate("dr", &row, &map)
        };

        assert!(with_id("12345678").is_empty()); // 8: IČO
        assert!(with_id("123456789").is_empty()); // 9
        assert!(with_id("9001011234").is_empty()); // 10
        assert!(!with_id("").is_empty());
        assert!(!with_id("1234567").is_empty()); // 7
        assert!(!with_id("12345678901").is_empty()); // 11
        // Non-digits are stripped before counting.
        assert!(with_id("900101/1234").is_empty());

        let errors = with_id("123");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("8 číslic"));
        assert!(errors[0].contains("9 až 10"));
    }

    #[test]
    fn test_present_or_zero() {
        let map = map_of(&[
            "Titul, meno a priezvisko",
            "rodné číslo",
            "adresa objektu",
            "číslo domu",
            "Obec",
        ]);
        let with_house = |c: Cell| {
            let row = vec![
                t("Eva Malá"),
                t("8551021234"),
                t("Krátka 7, 010 01 Žilina"),
                c,
                t("Žilina"),
            ];
            validate("ub", &row, &map)
        };

        assert!(with_house(Cell::Number(0.0)).is_empty());
        assert!(with_house(t("0")).is_empty());
        assert!(with_house(t("0.0")).is_empty());
        assert!(with_house(t("12")).is_empty());
        assert!(!with_house(t("")).is_empty());
        assert!(!with_house(t("   ")).is_empty());
        assert!(!with_house(Cell::Empty).is_empty());
    }

    #[test]
    fn test_vp_full_battery_order() {
        let map = map_of(&[
            "IČO",
            "Názov dodávateľa",
            "Sídlo dodávateľa",
            "Druh tovaru",
            "Množstvo",
            "EČV vozidla",
            "Obec",
        ]);
        let row: Row = vec![Cell::Empty; 7];
        let errors = validate("vp", &row, &map);
        assert_eq!(errors.len(), 7);
        assert!(errors[0].contains("IČO"));
        assert!(errors[1].contains("Názov dodávateľa"));
        assert!(errors[6].contains("Obec"));
    }

    #[test]
    fn test_absent_column_counts_as_missing() {
        // Map lacks "profesia" entirely; the rule reports it missing.
        let map = map_of(&[
            "rodné číslo",
            "Titul, meno a priezvisko",
            "adresa trvalého pobytu",
            "Obec",
        ]);
        let errors = validate("pp", &valid_dr_row(), &map);
        assert_eq!(errors, vec!["Chýba hodnota v stĺpci „profesia“."]);
    }
}
