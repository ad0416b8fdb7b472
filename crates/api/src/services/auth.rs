//! Authentication service for claimed accounts.

use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use domain::models::claim::LoginResponse;
use domain::models::user::{AccountState, User, UserSummary};
use persistence::repositories::{OrganizationRepository, UserRepository};
use shared::password::{verify_password, PasswordError};
use shared::token::{TokenCodec, TokenError};

use crate::error::ApiError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // One message for bad email, bad password and unclaimed ghost,
            // so the endpoint cannot be used to probe which accounts exist
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("Invalid email or password".to_string())
            }
            AuthError::UserNotFound => ApiError::Unauthorized("Invalid token".to_string()),
            AuthError::TokenError(e) => e.into(),
            AuthError::PasswordError(e) => e.into(),
            AuthError::DatabaseError(e) => e.into(),
        }
    }
}

/// Service for login and session introspection.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(pool: PgPool, codec: Arc<TokenCodec>) -> Self {
        Self { pool, codec }
    }

    /// Login with email and password.
    ///
    /// Ghost accounts have no credential and fail exactly like a wrong
    /// password does.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let users = UserRepository::new(self.pool.clone());

        let user = users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let password_hash = match &user.state {
            AccountState::Claimed { password_hash } => password_hash.clone(),
            AccountState::Ghost => return Err(AuthError::InvalidCredentials),
        };

        if !verify_password(password, &password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        users.record_login(user.id).await?;

        let (access, _) = self.codec.generate_access_token(user.id)?;
        let (refresh, _) = self.codec.generate_refresh_token(user.id)?;

        info!(user_id = %user.id, "User logged in");

        let organization_name = self.organization_name(&user).await?;

        Ok(LoginResponse {
            access,
            refresh,
            user: UserSummary::from_user(&user, organization_name),
        })
    }

    /// Look up the authenticated user's profile.
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserSummary, AuthError> {
        let users = UserRepository::new(self.pool.clone());

        let user = users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let organization_name = self.organization_name(&user).await?;

        Ok(UserSummary::from_user(&user, organization_name))
    }

    /// Load the full user record behind a validated access token.
    pub async fn load_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        let users = UserRepository::new(self.pool.clone());

        users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn organization_name(&self, user: &User) -> Result<Option<String>, AuthError> {
        let Some(org_id) = user.organization_id else {
            return Ok(None);
        };

        let orgs = OrganizationRepository::new(self.pool.clone());
        Ok(orgs.find_by_id(org_id).await?.map(|org| org.name))
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_maps_to_unauthorized() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        let err: ApiError = AuthError::InvalidCredentials.into();
        let ApiError::Unauthorized(message) = err else {
            panic!("expected Unauthorized");
        };
        assert_eq!(message, "Invalid email or password");
    }

    #[test]
    fn test_user_not_found_maps_to_unauthorized() {
        let err: ApiError = AuthError::UserNotFound.into();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
