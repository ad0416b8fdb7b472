//! Shared utilities for the Exportdesk backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Signed token codec (session and account-claim tokens)
//! - Password hashing with Argon2id
//! - Share-link token generation and hashing

pub mod crypto;
pub mod password;
pub mod token;
