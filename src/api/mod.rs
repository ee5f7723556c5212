//! HTTP surface for the wizard frontend.
//!
//! - [`notify`] - notification sink streamed to clients via SSE
//! - [`server`] - axum REST endpoints
//! - [`types`] - JSON response types

pub mod notify;
pub mod server;
pub mod types;
