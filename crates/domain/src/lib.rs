//! Domain layer for the Exportdesk backend.
//!
//! This crate contains:
//! - Domain models (Organization, User, BusinessRelation, Shipment)
//! - Request/response types for the claim and signing flows
//! - Validation rules for externally supplied identifiers

pub mod models;
