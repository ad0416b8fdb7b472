//! User domain models.
//!
//! Ghost users are placeholders an exporter creates alongside a shadow
//! organization: they have an email but no credential and cannot log in until
//! the account is claimed. The credential lives inside [`AccountState`] so a
//! claimed user without a password hash cannot be expressed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Role of a user within their organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Operator,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Operator => "OPERATOR",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "OPERATOR" => Ok(Role::Operator),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether an account has been claimed.
///
/// A ghost account carries no credential at all; a claimed account always
/// carries one. There is no third state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    /// Invitation pending, no credential set
    Ghost,
    /// Claimed account with a stored Argon2id hash
    Claimed { password_hash: String },
}

impl AccountState {
    pub fn is_ghost(&self) -> bool {
        matches!(self, AccountState::Ghost)
    }

    /// The stored credential hash, absent for ghost accounts.
    pub fn password_hash(&self) -> Option<&str> {
        match self {
            AccountState::Ghost => None,
            AccountState::Claimed { password_hash } => Some(password_hash),
        }
    }
}

/// User domain model.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub organization_id: Option<Uuid>,
    pub role: Role,
    pub state: AccountState,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_ghost(&self) -> bool {
        self.state.is_ghost()
    }
}

/// User summary returned by login, claim and `me` responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub organization: Option<Uuid>,
    pub organization_name: Option<String>,
    pub role: Role,
}

impl UserSummary {
    pub fn from_user(user: &User, organization_name: Option<String>) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            organization: user.organization_id,
            organization_name,
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ghost_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "buyer@importer.example".to_string(),
            name: String::new(),
            organization_id: Some(Uuid::new_v4()),
            role: Role::Operator,
            state: AccountState::Ghost,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("OPERATOR").unwrap(), Role::Operator);
        assert!(Role::from_str("owner").is_err());
        assert_eq!(format!("{}", Role::Admin), "ADMIN");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
    }

    #[test]
    fn test_ghost_has_no_credential() {
        let user = ghost_user();
        assert!(user.is_ghost());
        assert!(user.state.password_hash().is_none());
    }

    #[test]
    fn test_claimed_always_has_credential() {
        let state = AccountState::Claimed {
            password_hash: "$argon2id$...".to_string(),
        };
        assert!(!state.is_ghost());
        assert_eq!(state.password_hash(), Some("$argon2id$..."));
    }

    #[test]
    fn test_user_summary_never_exposes_credential() {
        let mut user = ghost_user();
        user.state = AccountState::Claimed {
            password_hash: "$argon2id$secret".to_string(),
        };

        let summary = UserSummary::from_user(&user, Some("Atlantic Foods".to_string()));
        let json = serde_json::to_string(&summary).unwrap();

        assert!(!json.contains("argon2id"));
        assert!(json.contains("\"organization_name\":\"Atlantic Foods\""));
    }
}
