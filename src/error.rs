//! Error types for the agendagen pipeline.
//!
//! This module defines a hierarchy of error types, one enum per concern:
//!
//! - [`SheetError`] - spreadsheet decoding errors
//! - [`ProcessError`] - agenda dataset transformation errors
//! - [`TemplateError`] - template fetching and rendering errors
//! - [`GenerateError`] - document generation and archival errors
//! - [`StoreError`] - session persistence errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Spreadsheet Decoding Errors
// =============================================================================

/// Errors while decoding an uploaded spreadsheet.
#[derive(Debug, Error)]
pub enum SheetError {
    /// The bytes are not a readable workbook.
    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    /// The workbook contains no worksheets.
    #[error("Workbook contains no worksheets")]
    NoWorksheet,
}

// =============================================================================
// Agenda Transformation Errors
// =============================================================================

/// Errors while transforming raw sheets into a canonical dataset.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A required input slot has no uploaded file.
    #[error("Missing required input: {0}")]
    MissingInput(String),

    /// Sheet decoding failed.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    /// The header marker row was not found anywhere in the sheet.
    #[error("Header row not found (marker: '{marker}')")]
    HeaderNotFound { marker: String },

    /// A column required by the transformation is absent.
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// The transformation produced a header but zero data rows.
    #[error("Transformation produced no data rows")]
    EmptyResult,
}

// =============================================================================
// Template Errors
// =============================================================================

/// Errors from the template cache and the docx renderer.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Fetching the template payload did not succeed.
    #[error("Template fetch failed for {location}: {status}")]
    FetchFailed { location: String, status: String },

    /// The template bytes are not a valid document package.
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// Rendering the template failed.
    #[error("Template render failed: {0}")]
    Render(String),
}

// =============================================================================
// Generation Errors
// =============================================================================

/// Errors from the generation strategies.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// No canonical dataset is available (absent or empty).
    #[error("No processed data available for generation")]
    NoProcessedData,

    /// The generator key is not registered.
    #[error("Unknown generator: {0}")]
    UnknownGenerator(String),

    /// The generator's enabling condition is not satisfied.
    #[error("Generator not ready: {0}")]
    NotReady(String),

    /// Another generation is already in flight.
    #[error("A generation is already in progress")]
    Busy,

    /// Template error during generation.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Tabular output writing failed.
    #[error("Tabular output error: {0}")]
    Tabular(String),

    /// Archive assembly failed.
    #[error("Archive error: {0}")]
    Archive(String),
}

// =============================================================================
// Session Store Errors
// =============================================================================

/// Errors from the durable session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("Store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Transformation error.
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Generation error.
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Top-level Error
// =============================================================================

/// Top-level error wrapping all pipeline concerns.
///
/// Returned by the CLI entry points; every failure is local to one
/// user-triggered operation, none is fatal to the process.
#[derive(Debug, Error)]
pub enum AgendaError {
    /// Sheet decoding error.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),

    /// Transformation error.
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Template error.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Generation error.
    #[error("Generate error: {0}")]
    Generate(#[from] GenerateError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Server error.
    #[error("Server error: {0}")]
    Server(#[from] ServerError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for sheet operations.
pub type SheetResult<T> = Result<T, SheetError>;

/// Result type for transformation operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Result type for generation operations.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for top-level operations.
pub type AgendaResult<T> = Result<T, AgendaError>;
