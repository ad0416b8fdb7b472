//! Account-claim service.
//!
//! Covers the full shadow-account lifecycle: an exporter pre-creates a
//! client organization in UNCLAIMED state with a ghost user attached, a
//! claim token is mailed to the client, and the client later claims the
//! account by setting a password, which atomically activates the
//! organization.

use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::claim::{ClaimAccountRequest, ClaimAccountResponse, VerifyClaimResponse};
use domain::models::organization::{CreateClientRequest, CreateClientResponse, Organization};
use domain::models::user::UserSummary;
use domain::models::OrgStatus;
use persistence::entities::organization::{OrgStatusDb, OrganizationEntity};
use persistence::entities::user::UserEntity;
use persistence::metrics::QueryTimer;
use persistence::repositories::{OrganizationRepository, RelationRepository};
use shared::password::{hash_password, PasswordError};
use shared::token::{TokenCodec, TokenError};

use crate::error::ApiError;
use crate::services::email::EmailService;

/// Errors that can occur during claim operations.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Account already claimed")]
    AlreadyClaimed,

    #[error("Organization not found")]
    OrganizationNotFound,

    #[error("Organization is suspended")]
    OrganizationSuspended,

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),

    #[error("Password error: {0}")]
    PasswordError(#[from] PasswordError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::AlreadyClaimed => ApiError::AlreadyClaimed,
            ClaimError::OrganizationNotFound => {
                ApiError::OrganizationNotFound("Organization not found".to_string())
            }
            ClaimError::OrganizationSuspended => ApiError::OrganizationSuspended,
            ClaimError::TokenError(e) => e.into(),
            ClaimError::PasswordError(e) => e.into(),
            ClaimError::DatabaseError(e) => e.into(),
        }
    }
}

/// Service for the claim lifecycle.
#[derive(Clone)]
pub struct ClaimService {
    pool: PgPool,
    codec: Arc<TokenCodec>,
    email: EmailService,
}

impl ClaimService {
    pub fn new(pool: PgPool, codec: Arc<TokenCodec>, email: EmailService) -> Self {
        Self { pool, codec, email }
    }

    /// Add a client to the exporter's agenda.
    ///
    /// When the client already exists on the platform (matched by tax id
    /// first, then by contact-email domain), only the agenda link is added.
    /// Otherwise a shadow organization, a ghost user and the agenda link are
    /// created in one transaction, and a claim invitation is mailed after
    /// commit so a delivery failure never rolls back the account.
    pub async fn create_shadow_client(
        &self,
        exporter: &Organization,
        request: &CreateClientRequest,
    ) -> Result<CreateClientResponse, ClaimError> {
        let orgs = OrganizationRepository::new(self.pool.clone());

        if let Some(existing) = self.lookup_existing(&orgs, request).await? {
            return self.link_existing(exporter, existing, request).await;
        }

        match self.create_shadow(exporter, request).await {
            Ok(outcome) => Ok(outcome),
            Err(ClaimError::DatabaseError(sqlx::Error::Database(db_err)))
                if db_err.code().as_deref() == Some("23505") =>
            {
                // Lost a race against a concurrent creation of the same
                // client. The unique index is on tax id, so the winner is
                // findable and we fall back to the linking path.
                let existing = self
                    .lookup_existing(&orgs, request)
                    .await?
                    .ok_or(ClaimError::DatabaseError(sqlx::Error::Database(db_err)))?;
                self.link_existing(exporter, existing, request).await
            }
            Err(e) => Err(e),
        }
    }

    /// Verify a claim token without consuming it.
    ///
    /// Used by the claim page to show the invitee who they are claiming as
    /// before asking for a password.
    pub async fn verify_claim_token(&self, token: &str) -> Result<VerifyClaimResponse, ClaimError> {
        let data = self.codec.validate_claim_token(token)?;

        let orgs = OrganizationRepository::new(self.pool.clone());
        let org = orgs
            .find_by_id(data.org_id)
            .await?
            .ok_or(ClaimError::OrganizationNotFound)?;

        match org.status {
            OrgStatus::Active => Err(ClaimError::AlreadyClaimed),
            OrgStatus::Suspended => Err(ClaimError::OrganizationSuspended),
            OrgStatus::Unclaimed => Ok(VerifyClaimResponse {
                valid: true,
                email: data.email,
                organization_name: Some(org.name),
                organization_id: Some(org.id),
            }),
        }
    }

    /// Claim an account: set the credential and activate the organization.
    ///
    /// The activation itself is a compare-and-set on the organization status
    /// inside one transaction, so exactly one of any number of concurrent
    /// claims succeeds and the rest see `AlreadyClaimed`.
    pub async fn claim_account(
        &self,
        token: &str,
        request: &ClaimAccountRequest,
    ) -> Result<ClaimAccountResponse, ClaimError> {
        let data = self.codec.validate_claim_token(token)?;

        let orgs = OrganizationRepository::new(self.pool.clone());
        let org = orgs
            .find_by_id(data.org_id)
            .await?
            .ok_or(ClaimError::OrganizationNotFound)?;

        match org.status {
            OrgStatus::Active => return Err(ClaimError::AlreadyClaimed),
            OrgStatus::Suspended => return Err(ClaimError::OrganizationSuspended),
            OrgStatus::Unclaimed => {}
        }

        let password_hash = hash_password(&request.password)?;
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let Some((org, user)) = orgs
            .activate_claimed(data.org_id, data.user_id, &password_hash, name)
            .await?
        else {
            // Another claim won between the status check and the update.
            return Err(ClaimError::AlreadyClaimed);
        };

        let (access, _) = self.codec.generate_access_token(user.id)?;
        let (refresh, _) = self.codec.generate_refresh_token(user.id)?;

        info!(
            user_id = %user.id,
            org_id = %org.id,
            "Account claimed, organization activated"
        );

        Ok(ClaimAccountResponse {
            success: true,
            message: format!("Welcome to Exportdesk. {} is now active.", org.name),
            access,
            refresh,
            user: UserSummary::from_user(&user, Some(org.name)),
        })
    }

    /// Tax-id lookup first, contact-email domain second.
    ///
    /// The domain fallback can mis-link clients behind shared mail providers;
    /// the tax id is the authoritative key and should be provided whenever
    /// known.
    async fn lookup_existing(
        &self,
        orgs: &OrganizationRepository,
        request: &CreateClientRequest,
    ) -> Result<Option<Organization>, ClaimError> {
        if let Some(tax_id) = request.tax_id.as_deref() {
            if let Some(org) = orgs.find_by_tax_id(tax_id).await? {
                return Ok(Some(org));
            }
        }

        if let Some(domain) = request.contact_email.split('@').nth(1) {
            if let Some(org) = orgs.find_by_email_domain(domain).await? {
                return Ok(Some(org));
            }
        }

        Ok(None)
    }

    async fn link_existing(
        &self,
        exporter: &Organization,
        existing: Organization,
        request: &CreateClientRequest,
    ) -> Result<CreateClientResponse, ClaimError> {
        let relations = RelationRepository::new(self.pool.clone());
        relations
            .upsert(
                exporter.id,
                existing.id,
                relation_alias(request.alias.as_deref(), &existing.name),
            )
            .await?;

        info!(
            exporter_org = %exporter.id,
            client_org = %existing.id,
            "Existing client linked to agenda"
        );

        Ok(CreateClientResponse {
            id: existing.id,
            name: existing.name,
            status: existing.status,
            was_existing: true,
            message: "This client is already on Exportdesk and was added to your agenda"
                .to_string(),
        })
    }

    async fn create_shadow(
        &self,
        exporter: &Organization,
        request: &CreateClientRequest,
    ) -> Result<CreateClientResponse, ClaimError> {
        let timer = QueryTimer::new("create_shadow_client");
        let mut tx = self.pool.begin().await?;

        let org: OrganizationEntity = sqlx::query_as(
            r#"
            INSERT INTO organizations (name, country, tax_id, contact_email, status, created_by_org)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, tax_id, country, status, contact_email, created_by_org,
                      created_at, updated_at
            "#,
        )
        .bind(&request.name)
        .bind(&request.country)
        .bind(request.tax_id.as_deref())
        .bind(&request.contact_email)
        .bind(OrgStatusDb::from(OrgStatus::Unclaimed))
        .bind(exporter.id)
        .fetch_one(&mut *tx)
        .await?;

        let ghost: UserEntity = sqlx::query_as(
            r#"
            INSERT INTO users (email, name, organization_id, role, invite_pending, is_active)
            VALUES (LOWER($1), $2, $3, 'OPERATOR', TRUE, TRUE)
            RETURNING id, email, name, password_hash, organization_id, role, invite_pending,
                      is_active, created_at, last_login
            "#,
        )
        .bind(&request.contact_email)
        .bind(&request.name)
        .bind(org.id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO business_relations (host_org, partner_org, alias)
            VALUES ($1, $2, $3)
            ON CONFLICT (host_org, partner_org) DO NOTHING
            "#,
        )
        .bind(exporter.id)
        .bind(org.id)
        .bind(relation_alias(request.alias.as_deref(), &request.name))
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        let org: Organization = org.into();
        let ghost_id: Uuid = ghost.id;

        let (claim_token, _) =
            self.codec
                .generate_claim_token(ghost_id, org.id, &request.contact_email)?;

        info!(
            exporter_org = %exporter.id,
            client_org = %org.id,
            ghost_user = %ghost_id,
            "Shadow client created, sending claim invitation"
        );

        // Fire-and-forget so mail outages never fail the request
        let email = self.email.clone();
        let to = request.contact_email.clone();
        let org_name = org.name.clone();
        let exporter_name = exporter.name.clone();
        tokio::spawn(async move {
            if let Err(e) = email
                .send_claim_invitation(&to, &org_name, &exporter_name, &claim_token)
                .await
            {
                warn!(to = %to, error = %e, "Failed to send claim invitation");
            }
        });

        Ok(CreateClientResponse {
            id: org.id,
            name: org.name.clone(),
            status: org.status,
            was_existing: false,
            message: format!(
                "Client created. An activation invitation was sent to {}.",
                request.contact_email
            ),
        })
    }
}

/// Agenda display name for a client link.
///
/// The `business_relations.alias` column is NOT NULL; a missing or blank
/// alias falls back to the partner organization's name.
fn relation_alias<'a>(alias: Option<&'a str>, partner_name: &'a str) -> &'a str {
    match alias.map(str::trim) {
        Some(alias) if !alias.is_empty() => alias,
        _ => partner_name,
    }
}

impl std::fmt::Debug for ClaimService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaimService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_error_maps_to_api_error() {
        assert!(matches!(
            ApiError::from(ClaimError::AlreadyClaimed),
            ApiError::AlreadyClaimed
        ));
        assert!(matches!(
            ApiError::from(ClaimError::OrganizationSuspended),
            ApiError::OrganizationSuspended
        ));
        assert!(matches!(
            ApiError::from(ClaimError::OrganizationNotFound),
            ApiError::OrganizationNotFound(_)
        ));
    }

    #[test]
    fn test_token_errors_map_to_token_invalid() {
        let err = ClaimError::TokenError(TokenError::TokenExpired);
        assert!(matches!(ApiError::from(err), ApiError::TokenInvalid));

        let err = ClaimError::TokenError(TokenError::InvalidToken);
        assert!(matches!(ApiError::from(err), ApiError::TokenInvalid));
    }

    #[test]
    fn test_weak_password_maps_to_validation() {
        let err = ClaimError::PasswordError(PasswordError::TooShort);
        assert!(matches!(ApiError::from(err), ApiError::Validation(_)));
    }

    #[test]
    fn test_relation_alias_keeps_explicit_alias() {
        assert_eq!(
            relation_alias(Some("ACME HQ"), "Acme Imports GmbH"),
            "ACME HQ"
        );
        assert_eq!(
            relation_alias(Some("  ACME HQ  "), "Acme Imports GmbH"),
            "ACME HQ"
        );
    }

    #[test]
    fn test_relation_alias_defaults_to_partner_name() {
        assert_eq!(relation_alias(None, "Acme Imports GmbH"), "Acme Imports GmbH");
        assert_eq!(relation_alias(Some(""), "Acme Imports GmbH"), "Acme Imports GmbH");
        assert_eq!(
            relation_alias(Some("   "), "Acme Imports GmbH"),
            "Acme Imports GmbH"
        );
    }
}
