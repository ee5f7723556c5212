//! Agendagen CLI - Generate administrative documents from xlsx sheets
//!
//! # Main Commands
//!
//! ```bash
//! agendagen serve                              # Start HTTP server (port 3000)
//! agendagen generate dr-preukazy ...           # Run one generator to a zip
//! agendagen offices                            # List selectable offices
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! agendagen process dr --subjects list.xlsx    # Transform inputs to JSON
//! agendagen preview dr --subjects list.xlsx    # Validate and summarize rows
//! agendagen generators                         # Show registered generators
//! agendagen reset                              # Drop the persisted session
//! ```

use agendagen::{
    find_generator, process, start_server, validate, Agenda, DocumentProcessor, SessionStore,
    Slot, SlotInputs, TemplateCache, GENERATORS, OFFICES,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "agendagen")]
#[command(about = "Generate administrative agenda documents from xlsx sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform input sheets into the canonical dataset and output JSON
    Process {
        /// Agenda key: vp, dr, ub or pp
        agenda: String,

        /// Subjects xlsx file
        #[arg(long)]
        subjects: PathBuf,

        /// Postal reference xlsx file (vp only)
        #[arg(long)]
        postal_reference: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Transform input sheets and report per-row validation findings
    Preview {
        /// Agenda key: vp, dr, ub or pp
        agenda: String,

        /// Subjects xlsx file
        #[arg(long)]
        subjects: PathBuf,

        /// Postal reference xlsx file (vp only)
        #[arg(long)]
        postal_reference: Option<PathBuf>,
    },

    /// Run one generator and write the finished archive
    Generate {
        /// Generator key, e.g. dr-preukazy
        generator: String,

        /// Subjects xlsx file
        #[arg(long)]
        subjects: PathBuf,

        /// Postal reference xlsx file (vp only)
        #[arg(long)]
        postal_reference: Option<PathBuf>,

        /// Office key, e.g. bb
        #[arg(long)]
        office: String,

        /// Case number interpolated into documents
        #[arg(long)]
        case_number: String,

        /// Local template directory (default: AGENDAGEN_TEMPLATE_BASE)
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Output zip file (default: the generator's archive name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List selectable offices
    Offices,

    /// List registered generators
    Generators {
        /// Restrict to one agenda key
        #[arg(short, long)]
        agenda: Option<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Local template directory (default: AGENDAGEN_TEMPLATE_BASE)
        #[arg(long)]
        templates: Option<PathBuf>,
    },

    /// Drop the persisted session
    Reset,
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Process {
            agenda,
            subjects,
            postal_reference,
            output,
        } => cmd_process(
            &agenda,
            &subjects,
            postal_reference.as_deref(),
            output.as_deref(),
        ),

        Commands::Preview {
            agenda,
            subjects,
            postal_reference,
        } => cmd_preview(&agenda, &subjects, postal_reference.as_deref()),

        Commands::Generate {
            generator,
            subjects,
            postal_reference,
            office,
            case_number,
            templates,
            output,
        } => {
            cmd_generate(
                &generator,
                &subjects,
                postal_reference.as_deref(),
                &office,
                &case_number,
                templates,
                output.as_deref(),
            )
            .await
        }

        Commands::Offices => cmd_offices(),

        Commands::Generators { agenda } => cmd_generators(agenda.as_deref()),

        Commands::Serve { port, templates } => cmd_serve(port, templates).await,

        Commands::Reset => cmd_reset(),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_agenda(key: &str) -> Result<Agenda, Box<dyn std::error::Error>> {
    Agenda::from_key(key).ok_or_else(|| format!("Unknown agenda: {}", key).into())
}

fn load_inputs(
    agenda: Agenda,
    subjects: &Path,
    postal_reference: Option<&Path>,
) -> Result<SlotInputs, Box<dyn std::error::Error>> {
    let mut inputs = SlotInputs::new();
    inputs.insert(Slot::Subjects, fs::read(subjects)?);
    if let Some(path) = postal_reference {
        inputs.insert(Slot::PostalReference, fs::read(path)?);
    } else if agenda.required_slots().contains(&Slot::PostalReference) {
        return Err("Agenda vp requires --postal-reference".into());
    }
    Ok(inputs)
}

/// Build the template cache from `--templates` or `AGENDAGEN_TEMPLATE_BASE`;
/// a base starting with `http` is treated as a URL prefix.
fn template_cache(templates: Option<PathBuf>) -> Result<TemplateCache, Box<dyn std::error::Error>> {
    if let Some(dir) = templates {
        return Ok(TemplateCache::dir(dir));
    }
    match std::env::var("AGENDAGEN_TEMPLATE_BASE") {
        Ok(base) if base.starts_with("http") => Ok(TemplateCache::http(base)),
        Ok(base) => Ok(TemplateCache::dir(base)),
        Err(_) => Err("No template source: pass --templates or set AGENDAGEN_TEMPLATE_BASE".into()),
    }
}

fn cmd_process(
    agenda_key: &str,
    subjects: &Path,
    postal_reference: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let agenda = parse_agenda(agenda_key)?;
    eprintln!("📄 Processing: {} ({})", subjects.display(), agenda.label());

    let inputs = load_inputs(agenda, subjects, postal_reference)?;
    let dataset = process(agenda, &inputs)?;

    eprintln!("✅ Transformed {} rows", dataset.len());

    let rows: Vec<Vec<String>> = dataset
        .rows
        .iter()
        .map(|row| row.iter().map(|c| c.text()).collect())
        .collect();
    let json = serde_json::to_string_pretty(&json!({
        "header": dataset.header,
        "rows": rows,
    }))?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_preview(
    agenda_key: &str,
    subjects: &Path,
    postal_reference: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let agenda = parse_agenda(agenda_key)?;
    eprintln!("✔️  Validating: {} ({})", subjects.display(), agenda.label());

    let inputs = load_inputs(agenda, subjects, postal_reference)?;
    let dataset = process(agenda, &inputs)?;
    let map = dataset.column_map();

    let mut valid = 0;
    let mut invalid = 0;
    for (i, row) in dataset.rows.iter().enumerate() {
        let errors = validate(agenda.key(), row, &map);
        if errors.is_empty() {
            valid += 1;
        } else {
            invalid += 1;
            if invalid <= 5 {
                eprintln!("\n❌ Row {} invalid:", i + 1);
                for err in errors.iter().take(3) {
                    eprintln!("   - {}", err);
                }
            }
        }
    }

    eprintln!("\n📊 Results: {} valid, {} invalid", valid, invalid);

    if invalid > 0 {
        std::process::exit(1);
    }

    Ok(())
}

async fn cmd_generate(
    generator_key: &str,
    subjects: &Path,
    postal_reference: Option<&Path>,
    office: &str,
    case_number: &str,
    templates: Option<PathBuf>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let spec = find_generator(generator_key)
        .ok_or_else(|| format!("Unknown generator: {}", generator_key))?;

    eprintln!("📄 Generating: {} ({})", spec.label, spec.key);

    let mut processor = DocumentProcessor::new(spec.agenda, template_cache(templates)?);
    processor
        .select_office(office)
        .ok_or_else(|| format!("Unknown office: {}", office))?;
    processor.save_case_number(case_number);

    let inputs = load_inputs(spec.agenda, subjects, postal_reference)?;
    for (slot, bytes) in inputs {
        processor.submit_input(slot, bytes)?;
    }

    let archive = processor.generate(generator_key).await?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&archive.name));
    fs::write(&path, &archive.bytes)?;

    eprintln!(
        "✅ {} documents archived to: {}",
        archive.entries,
        path.display()
    );
    Ok(())
}

fn cmd_offices() -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📋 Selectable offices ({}):\n", OFFICES.len());
    for office in OFFICES {
        println!("  🏢 {} ({})", office.name, office.key);
        println!("     {}, {}", office.address, office.postal_line);
        println!("     Tel: {}", office.phone);
        println!();
    }
    Ok(())
}

fn cmd_generators(agenda_key: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let filter = match agenda_key {
        Some(key) => Some(parse_agenda(key)?),
        None => None,
    };

    for spec in GENERATORS {
        if filter.is_some_and(|agenda| agenda != spec.agenda) {
            continue;
        }
        println!("  📄 {} ({})", spec.label, spec.key);
        println!("     Agenda: {}", spec.agenda.label());
        println!("     Archive: {}", spec.archive_name);
        println!();
    }
    Ok(())
}

async fn cmd_serve(
    port: u16,
    templates: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let processor = DocumentProcessor::new(Agenda::Dr, template_cache(templates)?)
        .with_store(SessionStore::new());
    start_server(port, processor).await
}

fn cmd_reset() -> Result<(), Box<dyn std::error::Error>> {
    SessionStore::new().clear()?;
    eprintln!("🗑️  Persisted session removed");
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
