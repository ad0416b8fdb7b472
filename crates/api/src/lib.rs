//! Exportdesk HTTP API.
//!
//! Wires the claim lifecycle, the document-signing flow and the exporter
//! agenda into an axum application.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod services;
