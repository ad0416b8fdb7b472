//! Business-logic services.

pub mod auth;
pub mod claim;
pub mod documents;
pub mod email;
