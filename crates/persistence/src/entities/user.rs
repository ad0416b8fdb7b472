//! User entity (database row mapping).
//!
//! The table stores `invite_pending` plus a nullable `password_hash`; the
//! conversion collapses them into the domain's two-state account model. Any
//! row without a credential is treated as a ghost, so a half-written claim
//! can never surface as a claimed user with no password.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{AccountState, Role, User};

/// Database enum for user_role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum RoleDb {
    Admin,
    Operator,
}

impl From<RoleDb> for Role {
    fn from(db: RoleDb) -> Self {
        match db {
            RoleDb::Admin => Self::Admin,
            RoleDb::Operator => Self::Operator,
        }
    }
}

impl From<Role> for RoleDb {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Operator => Self::Operator,
        }
    }
}

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: Option<String>,
    pub organization_id: Option<Uuid>,
    pub role: RoleDb,
    pub invite_pending: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        let state = match entity.password_hash {
            Some(password_hash) if !entity.invite_pending => AccountState::Claimed {
                password_hash,
            },
            _ => AccountState::Ghost,
        };

        Self {
            id: entity.id,
            email: entity.email,
            name: entity.name,
            organization_id: entity.organization_id,
            role: entity.role.into(),
            state,
            is_active: entity.is_active,
            created_at: entity.created_at,
            last_login: entity.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(password_hash: Option<&str>, invite_pending: bool) -> UserEntity {
        UserEntity {
            id: Uuid::new_v4(),
            email: "buyer@importer.example".to_string(),
            name: String::new(),
            password_hash: password_hash.map(String::from),
            organization_id: Some(Uuid::new_v4()),
            role: RoleDb::Operator,
            invite_pending,
            is_active: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_pending_row_maps_to_ghost() {
        let user: User = entity(None, true).into();
        assert!(user.is_ghost());
    }

    #[test]
    fn test_claimed_row_maps_to_claimed() {
        let user: User = entity(Some("$argon2id$hash"), false).into();
        assert_eq!(user.state.password_hash(), Some("$argon2id$hash"));
    }

    #[test]
    fn test_credentialless_row_is_ghost_even_if_not_pending() {
        let user: User = entity(None, false).into();
        assert!(user.is_ghost());
    }

    #[test]
    fn test_pending_row_with_hash_is_still_ghost() {
        let user: User = entity(Some("$argon2id$hash"), true).into();
        assert!(user.is_ghost());
    }
}
