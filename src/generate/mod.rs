//! Generator registry and the three generation strategies.
//!
//! A [`GeneratorSpec`] is static per-agenda configuration: which template it
//! renders (or tabular output), the unit of work (one row, a fixed-size
//! batch, or a group-by-column bucket), how output files are named, and how
//! a unit binds to template fields. Strategies collect one output file per
//! unit into a single zip archive; on any failure the whole run aborts and
//! nothing partial is returned.
//!
//! Long runs cooperatively yield between units so the serving task stays
//! responsive; this is not parallelism, and the orchestrator guarantees at
//! most one generation in flight.

use std::collections::HashMap;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::agenda::{Agenda, CanonicalDataset};
use crate::api::notify::{notify_progress, notify_success};
use crate::error::{GenerateError, GenerateResult};
use crate::office::Office;
use crate::sheet::columns::{find_key, ColumnMap};
use crate::sheet::{row_is_blank, Row};
use crate::template::{render_docx, TemplateCache};

/// Default batch size for the batched strategy.
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Yield interval for the row-by-row strategy.
const ROW_YIELD_INTERVAL: usize = 16;

/// Bucket label for rows with an empty grouping value.
pub const UNCLASSIFIED_GROUP: &str = crate::address::UNCLASSIFIED;

// =============================================================================
// Generator Configuration
// =============================================================================

/// Unit-of-work strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitStrategy {
    /// One output file per data row.
    Row,
    /// One output file per fixed-size batch of rows.
    Batch { size: usize },
    /// One output file per group-by-column bucket.
    Group { column: &'static str },
}

/// What one unit produces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputKind {
    /// A rendered docx from a cached template.
    Docx { template_id: &'static str },
    /// A tabular file (rows as records) instead of a templated document.
    Tabular,
}

/// One unit of work handed to binders and naming functions.
pub struct BindUnit<'a> {
    /// The rows of this unit (exactly one for the row strategy).
    pub rows: Vec<&'a Row>,
    /// Group label (group strategy) or empty.
    pub label: String,
    /// Zero-based unit index within the run.
    pub index: usize,
}

/// Session values every bound document interpolates.
pub struct BindCtx<'a> {
    pub office: &'a Office,
    pub case_number: &'a str,
    pub map: &'a ColumnMap,
    pub header: &'a [String],
    /// Formatted as `%d.%m.%Y`.
    pub today: String,
}

impl BindCtx<'_> {
    /// Office, case number and date fields shared by every generator.
    fn common_fields(&self) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("urad".into(), self.office.name.to_string());
        fields.insert("urad_adresa".into(), self.office.address.to_string());
        fields.insert("urad_psc".into(), self.office.postal_line.to_string());
        fields.insert("urad_telefon".into(), self.office.phone.to_string());
        fields.insert("cislo_spisu".into(), self.case_number.to_string());
        fields.insert("datum".into(), self.today.clone());
        fields
    }
}

/// Static per-agenda, per-output configuration.
pub struct GeneratorSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub agenda: Agenda,
    pub unit: UnitStrategy,
    pub output: OutputKind,
    /// Name of the downloadable archive.
    pub archive_name: &'static str,
    /// Data-to-template-fields mapping function.
    pub bind: fn(&BindUnit<'_>, &BindCtx<'_>) -> HashMap<String, String>,
    /// Output-file naming function.
    pub file_name: fn(&BindUnit<'_>, &BindCtx<'_>) -> String,
}

// =============================================================================
// Registry
// =============================================================================

/// All registered generators, two per agenda.
pub static GENERATORS: &[GeneratorSpec] = &[
    GeneratorSpec {
        key: "vp-objednavky",
        label: "Objednávky dodávateľom",
        agenda: Agenda::Vp,
        unit: UnitStrategy::Row,
        output: OutputKind::Docx {
            template_id: "vp_objednavka.docx",
        },
        archive_name: "vp_objednavky.zip",
        bind: bind_vp_order,
        file_name: name_vp_order,
    },
    GeneratorSpec {
        key: "vp-trasy",
        label: "Prehľady podľa trás",
        agenda: Agenda::Vp,
        unit: UnitStrategy::Group {
            column: "Skrátený kód trasy",
        },
        output: OutputKind::Tabular,
        archive_name: "vp_trasy.zip",
        bind: bind_none,
        file_name: name_group_table,
    },
    GeneratorSpec {
        key: "dr-preukazy",
        label: "Preukazy doručovateľov",
        agenda: Agenda::Dr,
        unit: UnitStrategy::Row,
        output: OutputKind::Docx {
            template_id: "dr_preukaz.docx",
        },
        archive_name: "dr_preukazy.zip",
        bind: bind_dr_card,
        file_name: name_dr_card,
    },
    GeneratorSpec {
        key: "dr-zoznamy",
        label: "Zoznamy podľa obcí",
        agenda: Agenda::Dr,
        unit: UnitStrategy::Group {
            column: "Obec",
        },
        output: OutputKind::Docx {
            template_id: "dr_zoznam_obce.docx",
        },
        archive_name: "dr_zoznamy.zip",
        bind: bind_dr_roster,
        file_name: name_group_docx,
    },
    GeneratorSpec {
        key: "ub-rozhodnutia",
        label: "Rozhodnutia o ubytovaní",
        agenda: Agenda::Ub,
        unit: UnitStrategy::Row,
        output: OutputKind::Docx {
            template_id: "ub_rozhodnutie.docx",
        },
        archive_name: "ub_rozhodnutia.zip",
        bind: bind_ub_decision,
        file_name: name_ub_decision,
    },
    GeneratorSpec {
        key: "ub-obce",
        label: "Kapacity podľa obcí",
        agenda: Agenda::Ub,
        unit: UnitStrategy::Group {
            column: "Obec",
        },
        output: OutputKind::Tabular,
        archive_name: "ub_obce.zip",
        bind: bind_none,
        file_name: name_group_table,
    },
    GeneratorSpec {
        key: "pp-povolavacie",
        label: "Povolávacie rozkazy",
        agenda: Agenda::Pp,
        unit: UnitStrategy::Batch {
            size: DEFAULT_BATCH_SIZE,
        },
        output: OutputKind::Docx {
            template_id: "pp_povolavaci_rozkaz.docx",
        },
        archive_name: "pp_povolavacie.zip",
        bind: bind_pp_summons,
        file_name: name_pp_batch,
    },
    GeneratorSpec {
        key: "pp-prehlady",
        label: "Prehľady podľa profesií",
        agenda: Agenda::Pp,
        unit: UnitStrategy::Group {
            column: "profesia",
        },
        output: OutputKind::Tabular,
        archive_name: "pp_prehlady.zip",
        bind: bind_none,
        file_name: name_group_table,
    },
];

/// Look up a generator by key.
pub fn find_generator(key: &str) -> Option<&'static GeneratorSpec> {
    GENERATORS.iter().find(|g| g.key == key)
}

/// Generators registered for one agenda, in declaration order.
pub fn generators_for(agenda: Agenda) -> Vec<&'static GeneratorSpec> {
    GENERATORS.iter().filter(|g| g.agenda == agenda).collect()
}

// =============================================================================
// Strategy Execution
// =============================================================================

/// A finished generation run: one archive with one entry per unit.
#[derive(Debug)]
pub struct ArchiveOutput {
    pub name: String,
    pub bytes: Vec<u8>,
    pub entries: usize,
}

/// Run one generator over the canonical dataset and archive its outputs.
///
/// Fails fast with [`GenerateError::NoProcessedData`] on an absent or empty
/// dataset; any mid-run failure aborts remaining units and discards what was
/// already produced.
pub async fn run_generator(
    spec: &GeneratorSpec,
    dataset: &CanonicalDataset,
    ctx: &BindCtx<'_>,
    cache: &mut TemplateCache,
) -> GenerateResult<ArchiveOutput> {
    // Fully-blank rows never produce an archive entry.
    let rows: Vec<&Row> = dataset.rows.iter().filter(|r| !row_is_blank(r)).collect();
    if rows.is_empty() {
        return Err(GenerateError::NoProcessedData);
    }

    let units = split_units(spec, &rows, ctx);
    let total = units.len();

    let mut entries: Vec<(String, Vec<u8>)> = Vec::with_capacity(total);
    for unit in units {
        let progress_label = if unit.label.is_empty() {
            spec.label.to_string()
        } else {
            unit.label.clone()
        };
        notify_progress(unit.index + 1, total, &progress_label);

        let bytes = match spec.output {
            OutputKind::Docx { template_id } => {
                let template = cache.ensure_loaded(template_id).await?.to_vec();
                let fields = (spec.bind)(&unit, ctx);
                render_docx(&template, &fields)?
            }
            OutputKind::Tabular => tabular_bytes(ctx.header, &unit.rows)?,
        };
        entries.push(((spec.file_name)(&unit, ctx), bytes));

        // Keep the serving task responsive on long runs.
        let yield_due = match spec.unit {
            UnitStrategy::Row => (unit.index + 1) % ROW_YIELD_INTERVAL == 0,
            _ => true,
        };
        if yield_due {
            tokio::task::yield_now().await;
        }
    }

    let bytes = write_archive(&entries)?;
    notify_success(format!(
        "{}: {} súborov zbalených do {}",
        spec.label,
        entries.len(),
        spec.archive_name
    ));

    Ok(ArchiveOutput {
        name: spec.archive_name.to_string(),
        bytes,
        entries: entries.len(),
    })
}

/// Partition non-blank rows into units per the generator's strategy.
fn split_units<'a>(
    spec: &GeneratorSpec,
    rows: &[&'a Row],
    ctx: &BindCtx<'_>,
) -> Vec<BindUnit<'a>> {
    match spec.unit {
        UnitStrategy::Row => rows
            .iter()
            .enumerate()
            .map(|(index, row)| BindUnit {
                rows: vec![row],
                label: String::new(),
                index,
            })
            .collect(),
        UnitStrategy::Batch { size } => rows
            .chunks(size.max(1))
            .enumerate()
            .map(|(index, chunk)| BindUnit {
                rows: chunk.to_vec(),
                label: String::new(),
                index,
            })
            .collect(),
        UnitStrategy::Group { column } => {
            let col = find_key(ctx.map, column);
            // First-seen order keeps output deterministic for a given sheet.
            let mut order: Vec<String> = Vec::new();
            let mut buckets: HashMap<String, Vec<&'a Row>> = HashMap::new();
            for row in rows {
                let value = col
                    .and_then(|idx| row.get(idx))
                    .map(|c| c.text().trim().to_string())
                    .unwrap_or_default();
                let label = if value.is_empty() {
                    UNCLASSIFIED_GROUP.to_string()
                } else {
                    value
                };
                if !buckets.contains_key(&label) {
                    order.push(label.clone());
                }
                buckets.entry(label).or_default().push(row);
            }
            order
                .into_iter()
                .enumerate()
                .map(|(index, label)| BindUnit {
                    rows: buckets.remove(&label).unwrap_or_default(),
                    label,
                    index,
                })
                .collect()
        }
    }
}

/// Serialize a unit as a tabular file: canonical header plus its rows.
fn tabular_bytes(header: &[String], rows: &[&Row]) -> GenerateResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer
        .write_record(header)
        .map_err(|e| GenerateError::Tabular(e.to_string()))?;
    for row in rows {
        let record: Vec<String> = row.iter().map(|c| c.text()).collect();
        writer
            .write_record(&record)
            .map_err(|e| GenerateError::Tabular(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| GenerateError::Tabular(e.to_string()))
}

/// Package all produced outputs into one archive.
fn write_archive(entries: &[(String, Vec<u8>)]) -> GenerateResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| GenerateError::Archive(e.to_string()))?;
        writer
            .write_all(bytes)
            .map_err(|e| GenerateError::Archive(e.to_string()))?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| GenerateError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

// =============================================================================
// Binders and Naming
// =============================================================================

/// First-row column value of a unit, via tolerant lookup.
fn unit_field(unit: &BindUnit<'_>, ctx: &BindCtx<'_>, column: &str) -> String {
    unit.rows
        .first()
        .and_then(|row| find_key(ctx.map, column).and_then(|idx| row.get(idx)))
        .map(|c| c.text().trim().to_string())
        .unwrap_or_default()
}

/// Column values of every row in a unit.
fn unit_column(unit: &BindUnit<'_>, ctx: &BindCtx<'_>, column: &str) -> Vec<String> {
    let idx = find_key(ctx.map, column);
    unit.rows
        .iter()
        .map(|row| {
            idx.and_then(|i| row.get(i))
                .map(|c| c.text().trim().to_string())
                .unwrap_or_default()
        })
        .collect()
}

fn bind_none(_unit: &BindUnit<'_>, _ctx: &BindCtx<'_>) -> HashMap<String, String> {
    HashMap::new()
}

fn bind_vp_order(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> HashMap<String, String> {
    let mut fields = ctx.common_fields();
    for (key, column) in [
        ("dodavatel", "Názov dodávateľa"),
        ("ico", "IČO"),
        ("sidlo", "Sídlo dodávateľa"),
        ("druh_tovaru", "Druh tovaru"),
        ("merna_jednotka", "Merná jednotka"),
        ("mnozstvo", "Množstvo"),
        ("den_dodania", "Deň dodania"),
        ("miesto_dodania", "Miesto dodania"),
        ("kod_trasy", "Kód trasy"),
        ("ecv", "EČV vozidla"),
        ("obec", "Obec"),
        ("psc_posta", "PSČ a dodacia pošta"),
    ] {
        fields.insert(key.to_string(), unit_field(unit, ctx, column));
    }
    fields
}

fn bind_dr_card(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> HashMap<String, String> {
    let mut fields = ctx.common_fields();
    fields.insert("meno".into(), unit_field(unit, ctx, "Titul, meno a priezvisko"));
    fields.insert("rodne_cislo".into(), unit_field(unit, ctx, "rodné číslo"));
    fields.insert("adresa".into(), unit_field(unit, ctx, "adresa trvalého pobytu"));
    fields.insert("obec".into(), unit_field(unit, ctx, "Obec"));
    fields
}

fn bind_dr_roster(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> HashMap<String, String> {
    let mut fields = ctx.common_fields();
    let names = unit_column(unit, ctx, "Titul, meno a priezvisko");
    fields.insert("obec".into(), unit.label.clone());
    fields.insert("pocet".into(), unit.rows.len().to_string());
    fields.insert("zoznam".into(), names.join("\n"));
    fields
}

fn bind_ub_decision(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> HashMap<String, String> {
    let mut fields = ctx.common_fields();
    fields.insert("meno".into(), unit_field(unit, ctx, "Titul, meno a priezvisko"));
    fields.insert("rodne_cislo".into(), unit_field(unit, ctx, "rodné číslo"));
    fields.insert("adresa_objektu".into(), unit_field(unit, ctx, "adresa objektu"));
    fields.insert("cislo_domu".into(), unit_field(unit, ctx, "číslo domu"));
    fields.insert("kapacita".into(), unit_field(unit, ctx, "kapacita"));
    fields.insert("obec".into(), unit_field(unit, ctx, "Obec"));
    fields
}

fn bind_pp_summons(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> HashMap<String, String> {
    let mut fields = ctx.common_fields();
    let names = unit_column(unit, ctx, "Titul, meno a priezvisko");
    let professions = unit_column(unit, ctx, "profesia");
    let lines: Vec<String> = names
        .iter()
        .zip(professions.iter())
        .map(|(name, profession)| format!("{} – {}", name, profession))
        .collect();
    fields.insert("pocet".into(), unit.rows.len().to_string());
    fields.insert("zoznam".into(), lines.join("\n"));
    fields
}

fn name_vp_order(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> String {
    format!(
        "objednavka_{:03}_{}.docx",
        unit.index + 1,
        slugify(&unit_field(unit, ctx, "Názov dodávateľa"))
    )
}

fn name_dr_card(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> String {
    format!(
        "preukaz_{:03}_{}.docx",
        unit.index + 1,
        slugify(&unit_field(unit, ctx, "Titul, meno a priezvisko"))
    )
}

fn name_ub_decision(unit: &BindUnit<'_>, ctx: &BindCtx<'_>) -> String {
    format!(
        "rozhodnutie_{:03}_{}.docx",
        unit.index + 1,
        slugify(&unit_field(unit, ctx, "Titul, meno a priezvisko"))
    )
}

fn name_pp_batch(unit: &BindUnit<'_>, _ctx: &BindCtx<'_>) -> String {
    format!("povolavacie_{:02}.docx", unit.index + 1)
}

fn name_group_docx(unit: &BindUnit<'_>, _ctx: &BindCtx<'_>) -> String {
    format!("zoznam_{}.docx", slugify(&unit.label))
}

fn name_group_table(unit: &BindUnit<'_>, _ctx: &BindCtx<'_>) -> String {
    format!("prehlad_{}.csv", slugify(&unit.label))
}

/// Filesystem-safe slug of a free-text value.
pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::office::find_office;
    use crate::sheet::Cell;
    use crate::template::TemplateCache;
    use std::io::Read;
    use zip::ZipArchive;

    fn t(s: &str) -> Cell {
        Cell::Text(s.to_string())
    }

    fn dr_dataset() -> CanonicalDataset {
        CanonicalDataset {
            header: vec![
                "Titul, meno a priezvisko".into(),
                "rodné číslo".into(),
                "adresa trvalého pobytu".into(),
                "Obec".into(),
            ],
            rows: vec![
                vec![
                    t("Ján Novák"),
                    t("9001011234"),
                    t("Hlavná 1, 974 01 Banská Bystrica"),
                    t("Banská Bystrica"),
                ],
                vec![
                    t("Eva Malá"),
                    t("8551021234"),
                    t("Krátka 7, 960 01 Zvolen"),
                    t("Zvolen"),
                ],
                // Blank row must never produce an archive entry.
                vec![Cell::Empty, t(""), t("  "), t("")],
            ],
        }
    }

    fn ctx<'a>(map: &'a ColumnMap, header: &'a [String]) -> BindCtx<'a> {
        BindCtx {
            office: find_office("bb").unwrap(),
            case_number: "OU-BB-2024/123",
            map,
            header,
            today: "01.06.2024".to_string(),
        }
    }

    fn docx_template(body: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn archive_names(bytes: &[u8]) -> Vec<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_row_strategy_skips_blank_rows() {
        let dataset = dr_dataset();
        let map = dataset.column_map();
        let ctx = ctx(&map, &dataset.header);

        let mut payloads = HashMap::new();
        payloads.insert(
            "dr_preukaz.docx".to_string(),
            docx_template("<w:t>{{meno}} / {{cislo_spisu}}</w:t>"),
        );
        let mut cache = TemplateCache::fixed(payloads);

        let spec = find_generator("dr-preukazy").unwrap();
        let out = run_generator(spec, &dataset, &ctx, &mut cache).await.unwrap();

        assert_eq!(out.entries, 2);
        assert_eq!(out.name, "dr_preukazy.zip");
        let names = archive_names(&out.bytes);
        assert!(names[0].contains("ján-novák"));
        // One template, many rows: exactly one fetch.
        assert_eq!(cache.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_group_strategy_tabular() {
        let mut dataset = dr_dataset();
        // Force one row into the unclassified bucket.
        dataset.rows[1][3] = t("");
        let map = dataset.column_map();
        let ctx = ctx(&map, &dataset.header);
        let mut cache = TemplateCache::fixed(HashMap::new());

        let spec = find_generator("ub-obce").unwrap();
        let out = run_generator(spec, &dataset, &ctx, &mut cache).await.unwrap();

        let names = archive_names(&out.bytes);
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.contains("banská-bystrica")));
        assert!(names.iter().any(|n| n.contains("unclassified")));
    }

    #[tokio::test]
    async fn test_batch_strategy_partitions() {
        let mut rows = Vec::new();
        for i in 0..19 {
            rows.push(vec![
                t(&format!("Osoba {}", i)),
                t("9001011234"),
                t("vodič"),
                t("Hlavná 1, 974 01 Banská Bystrica"),
                t("Banská Bystrica"),
            ]);
        }
        let dataset = CanonicalDataset {
            header: vec![
                "Titul, meno a priezvisko".into(),
                "rodné číslo".into(),
                "profesia".into(),
                "adresa trvalého pobytu".into(),
                "Obec".into(),
            ],
            rows,
        };
        let map = dataset.column_map();
        let ctx = ctx(&map, &dataset.header);

        let mut payloads = HashMap::new();
        payloads.insert(
            "pp_povolavaci_rozkaz.docx".to_string(),
            docx_template("<w:t>{{pocet}}: {{zoznam}}</w:t>"),
        );
        let mut cache = TemplateCache::fixed(payloads);

        let spec = find_generator("pp-povolavacie").unwrap();
        let out = run_generator(spec, &dataset, &ctx, &mut cache).await.unwrap();

        // 19 rows in batches of 8 -> 3 archive entries.
        assert_eq!(out.entries, 3);
    }

    #[tokio::test]
    async fn test_failed_template_discards_partial_output() {
        let dataset = dr_dataset();
        let map = dataset.column_map();
        let ctx = ctx(&map, &dataset.header);
        // No template configured: the run must fail, not emit a partial zip.
        let mut cache = TemplateCache::fixed(HashMap::new());

        let spec = find_generator("dr-preukazy").unwrap();
        let err = run_generator(spec, &dataset, &ctx, &mut cache)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerateError::Template(_)));
    }

    #[test]
    fn test_registry_covers_every_agenda() {
        for agenda in Agenda::ALL {
            assert!(!generators_for(agenda).is_empty());
        }
        assert!(find_generator("nope").is_none());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ján Novák"), "ján-novák");
        assert_eq!(slugify("  BB-12 / A  "), "bb-12-a");
    }
}
