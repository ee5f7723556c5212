//! # Agendagen - administrative agenda document generation
//!
//! Agendagen turns uploaded xlsx sheets of administrative subjects into
//! printable document archives for four agendas: supplier goods (`vp`),
//! delivery personnel (`dr`), lodging (`ub`) and labor duty (`pp`).
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  xlsx File  │────▶│   Agenda    │────▶│  Validate / │────▶│  Generate   │
//! │  (uploads)  │     │  Transform  │     │   Preview   │     │  (zip out)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agendagen::{process, Agenda, Slot, SlotInputs};
//!
//! let mut inputs = SlotInputs::new();
//! inputs.insert(Slot::Subjects, std::fs::read("list.xlsx").unwrap());
//! let dataset = process(Agenda::Dr, &inputs).unwrap();
//! println!("Transformed {} rows", dataset.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`sheet`] - xlsx decoding, header location, column mapping
//! - [`address`] - municipality derivation from address strings
//! - [`agenda`] - per-agenda transformations to the canonical dataset
//! - [`validate`] - per-agenda row validation batteries
//! - [`template`] - template cache and docx rendering
//! - [`generate`] - generation strategies and the generator registry
//! - [`session`] - session orchestration and durable persistence
//! - [`office`] - the static office table
//! - [`api`] - HTTP API server and notification sink

// Core modules
pub mod error;
pub mod office;

// Sheet decoding
pub mod sheet;

// Address derivation
pub mod address;

// Agenda transformations
pub mod agenda;

// Validation
pub mod validate;

// Templates
pub mod template;

// Generation
pub mod generate;

// Session orchestration
pub mod session;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    AgendaError, GenerateError, ProcessError, ServerError, SheetError, StoreError, TemplateError,
};

// =============================================================================
// Re-exports - Sheet
// =============================================================================

pub use sheet::{
    columns::{column_map, column_map_from_row, find_key, ColumnMap},
    header::{locate_header, MarkerMatch, MarkerScope},
    Cell, RawSheet, Row,
};

// =============================================================================
// Re-exports - Agenda
// =============================================================================

pub use agenda::{process, Agenda, CanonicalDataset, Slot, SlotInputs};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validate::validate;

// =============================================================================
// Re-exports - Templates
// =============================================================================

pub use template::{render_docx, Fetcher, TemplateCache};

// =============================================================================
// Re-exports - Generation
// =============================================================================

pub use generate::{
    find_generator, generators_for, run_generator, ArchiveOutput, BindCtx, GeneratorSpec,
    OutputKind, UnitStrategy, GENERATORS,
};

// =============================================================================
// Re-exports - Session
// =============================================================================

pub use session::{
    store::{PersistedSession, SessionStore},
    DocumentProcessor, GeneratorReadiness, Phase, Preview, PreviewRow,
};

// =============================================================================
// Re-exports - Offices
// =============================================================================

pub use office::{find_office, Office, OFFICES};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::notify::{Notice, Notifier, Progress, Severity, NOTIFIER};
pub use api::server::start_server;
pub use api::types::{error_response, SessionResponse, SlotState};
