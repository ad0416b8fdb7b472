//! Document access gate for the magic-link signing flow.
//!
//! Both the document view and the signature submission resolve the share
//! link and run the same claim gate, so the two endpoints can never
//! disagree about whether the buyer is allowed to sign.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use domain::models::document::{
    ClaimPrompt, DocumentViewResponse, MagicLink, Shipment, ShipmentStatus, SignAction,
    SignRequest, SignResponse, SignatureStatus,
};
use domain::models::OrgStatus;
use persistence::repositories::{
    DocumentRepository, NewSignature, OrganizationRepository, UserRepository,
};
use shared::crypto::sha256_hex;
use shared::token::{TokenCodec, TokenError};

use crate::error::ApiError;
use crate::services::email::EmailService;

/// Errors that can occur in the signing flow.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("This link has expired or was already used")]
    LinkInvalid,

    #[error("Account must be claimed before signing")]
    ClaimRequired,

    #[error("Organization is suspended")]
    OrganizationSuspended,

    #[error("This confirmation can no longer be signed")]
    NotSignable,

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::LinkInvalid => ApiError::LinkInvalid,
            DocumentError::ClaimRequired => ApiError::ClaimRequired,
            DocumentError::OrganizationSuspended => ApiError::OrganizationSuspended,
            DocumentError::NotSignable => {
                ApiError::Validation("This confirmation can no longer be signed".to_string())
            }
            DocumentError::TokenError(e) => e.into(),
            DocumentError::DatabaseError(e) => e.into(),
        }
    }
}

/// Result of the claim gate for a shipment's buyer organization.
#[derive(Debug, Default)]
struct ClaimGate {
    claim_required: bool,
    suspended: bool,
    prompt: Option<ClaimPrompt>,
}

/// Service behind the public `/api/sign` endpoints.
#[derive(Clone)]
pub struct DocumentService {
    pool: PgPool,
    codec: Arc<TokenCodec>,
    email: EmailService,
}

impl DocumentService {
    pub fn new(pool: PgPool, codec: Arc<TokenCodec>, email: EmailService) -> Self {
        Self { pool, codec, email }
    }

    /// Fetch a sales confirmation through its share link.
    ///
    /// When the buyer organization is still unclaimed the response carries a
    /// fresh claim token and prompt, so the signing page can walk the buyer
    /// through activation without a second round trip.
    pub async fn view_document(
        &self,
        shipment_id: Uuid,
        token: &str,
    ) -> Result<DocumentViewResponse, DocumentError> {
        let (shipment, link) = self.resolve_link(shipment_id, token).await?;

        let gate = self.claim_gate(&shipment).await?;
        if gate.suspended {
            return Err(DocumentError::OrganizationSuspended);
        }

        Ok(DocumentViewResponse {
            can_sign: shipment.status.is_signable(),
            expires_at: link.expires_at,
            claim_required: gate.claim_required,
            claim: gate.prompt,
            shipment,
        })
    }

    /// Submit a signature decision through a share link.
    ///
    /// Enforces, in order: link validity, organization standing (suspended,
    /// then unclaimed), and document lifecycle. The link is spent and the
    /// audit row written in one transaction.
    pub async fn submit_signature(
        &self,
        shipment_id: Uuid,
        token: &str,
        request: &SignRequest,
        ip_address: &str,
        user_agent: Option<&str>,
    ) -> Result<SignResponse, DocumentError> {
        let (shipment, link) = self.resolve_link(shipment_id, token).await?;

        let gate = self.claim_gate(&shipment).await?;
        if gate.suspended {
            return Err(DocumentError::OrganizationSuspended);
        }
        if gate.claim_required {
            return Err(DocumentError::ClaimRequired);
        }

        if !shipment.status.is_signable() {
            return Err(DocumentError::NotSignable);
        }

        let (new_status, signature_status) = match request.action {
            SignAction::Approve => (ShipmentStatus::Signed, SignatureStatus::Approved),
            SignAction::Reject => (ShipmentStatus::Draft, SignatureStatus::Rejected),
        };

        let docs = DocumentRepository::new(self.pool.clone());
        let signature = NewSignature {
            status: signature_status,
            signature_name: request.signature_name.as_deref(),
            rejection_comment: match request.action {
                SignAction::Reject => request.rejection_comment.as_deref(),
                SignAction::Approve => None,
            },
            ip_address,
            user_agent,
        };

        let Some(log) = docs
            .record_signature(link.id, shipment.id, new_status, signature)
            .await?
        else {
            // The link was spent by a concurrent submission.
            return Err(DocumentError::LinkInvalid);
        };

        info!(
            shipment_id = %shipment.id,
            status = %log.status.as_str(),
            "Signature recorded"
        );

        self.notify_owner(&shipment, log.status).await;

        let message = match log.status {
            SignatureStatus::Approved => "Sales confirmation signed".to_string(),
            SignatureStatus::Rejected => {
                "Sales confirmation rejected and returned to draft".to_string()
            }
        };

        Ok(SignResponse {
            message,
            status: log.status,
            signed_by: log.signature_name,
            rejection_comment: log.rejection_comment,
        })
    }

    /// Resolve a share link: the token is matched by digest and the link
    /// must be unspent and unexpired. A missing shipment and a bad token are
    /// indistinguishable to the caller.
    async fn resolve_link(
        &self,
        shipment_id: Uuid,
        token: &str,
    ) -> Result<(Shipment, MagicLink), DocumentError> {
        let docs = DocumentRepository::new(self.pool.clone());

        let shipment = docs
            .find_shipment(shipment_id)
            .await?
            .ok_or(DocumentError::LinkInvalid)?;

        let link = docs
            .find_magic_link(shipment_id, &sha256_hex(token))
            .await?
            .ok_or(DocumentError::LinkInvalid)?;

        if !link.is_valid(Utc::now()) {
            return Err(DocumentError::LinkInvalid);
        }

        Ok((shipment, link))
    }

    /// Shared claim gate: checks the buyer organization's standing and, when
    /// it is still unclaimed, builds the claim prompt for the signing page.
    async fn claim_gate(&self, shipment: &Shipment) -> Result<ClaimGate, DocumentError> {
        let Some(buyer_org_id) = shipment.buyer_org else {
            return Ok(ClaimGate::default());
        };

        let orgs = OrganizationRepository::new(self.pool.clone());
        let Some(org) = orgs.find_by_id(buyer_org_id).await? else {
            warn!(
                shipment_id = %shipment.id,
                buyer_org = %buyer_org_id,
                "Shipment references a missing buyer organization"
            );
            return Ok(ClaimGate::default());
        };

        match org.status {
            OrgStatus::Active => Ok(ClaimGate::default()),
            OrgStatus::Suspended => Ok(ClaimGate {
                suspended: true,
                ..ClaimGate::default()
            }),
            OrgStatus::Unclaimed => {
                let users = UserRepository::new(self.pool.clone());
                let prompt = match users.find_ghost_by_org(org.id).await? {
                    Some(ghost) => {
                        let (claim_token, _) =
                            self.codec
                                .generate_claim_token(ghost.id, org.id, &ghost.email)?;
                        Some(ClaimPrompt {
                            claim_token,
                            claim_email: ghost.email,
                            claim_org_name: org.name,
                            claim_message: "Your account was created by your trading partner. \
                                            Set a password to activate it and sign documents."
                                .to_string(),
                        })
                    }
                    None => {
                        warn!(
                            buyer_org = %org.id,
                            "Unclaimed organization has no pending ghost user"
                        );
                        None
                    }
                };

                Ok(ClaimGate {
                    claim_required: true,
                    suspended: false,
                    prompt,
                })
            }
        }
    }

    /// Best-effort exporter notification after a signature lands.
    async fn notify_owner(&self, shipment: &Shipment, status: SignatureStatus) {
        let orgs = OrganizationRepository::new(self.pool.clone());
        let owner_email = match orgs.find_by_id(shipment.owner_org).await {
            Ok(Some(org)) => org.contact_email,
            Ok(None) => None,
            Err(e) => {
                warn!(owner_org = %shipment.owner_org, error = %e, "Owner lookup failed");
                None
            }
        };

        let Some(to) = owner_email else {
            return;
        };

        let outcome = match status {
            SignatureStatus::Approved => "signed",
            SignatureStatus::Rejected => "rejected",
        };

        let email = self.email.clone();
        let internal_ref = shipment.internal_ref.clone();
        tokio::spawn(async move {
            if let Err(e) = email
                .send_signature_notification(&to, &internal_ref, outcome)
                .await
            {
                warn!(to = %to, error = %e, "Failed to send signature notification");
            }
        });
    }
}

impl std::fmt::Debug for DocumentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentService").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_errors_map_to_api_errors() {
        assert!(matches!(
            ApiError::from(DocumentError::LinkInvalid),
            ApiError::LinkInvalid
        ));
        assert!(matches!(
            ApiError::from(DocumentError::ClaimRequired),
            ApiError::ClaimRequired
        ));
        assert!(matches!(
            ApiError::from(DocumentError::OrganizationSuspended),
            ApiError::OrganizationSuspended
        ));
        assert!(matches!(
            ApiError::from(DocumentError::NotSignable),
            ApiError::Validation(_)
        ));
    }

    #[test]
    fn test_claim_gate_default_passes() {
        let gate = ClaimGate::default();
        assert!(!gate.claim_required);
        assert!(!gate.suspended);
        assert!(gate.prompt.is_none());
    }
}
