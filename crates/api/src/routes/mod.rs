//! HTTP route handlers.

pub mod auth;
pub mod claim;
pub mod clients;
pub mod health;
pub mod sign;
