//! Domain models for Exportdesk.

pub mod claim;
pub mod document;
pub mod organization;
pub mod relation;
pub mod user;

pub use organization::{Organization, OrgStatus};
pub use relation::BusinessRelation;
pub use user::{AccountState, Role, User};
