//! Database row mappings.

pub mod document;
pub mod organization;
pub mod relation;
pub mod user;
