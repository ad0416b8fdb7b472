//! Repository implementations.

pub mod document;
pub mod organization;
pub mod relation;
pub mod user;

pub use document::{DocumentRepository, NewSignature};
pub use organization::OrganizationRepository;
pub use relation::RelationRepository;
pub use user::UserRepository;
