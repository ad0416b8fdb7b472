//! Shipment, magic-link and signature models for the document-signing flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle of a shipment's sales confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Draft,
    ScSent,
    Signed,
    Completed,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Draft => "DRAFT",
            ShipmentStatus::ScSent => "SC_SENT",
            ShipmentStatus::Signed => "SIGNED",
            ShipmentStatus::Completed => "COMPLETED",
        }
    }

    /// A confirmation can be signed or rejected while drafted or sent.
    pub fn is_signable(&self) -> bool {
        matches!(self, ShipmentStatus::Draft | ShipmentStatus::ScSent)
    }
}

impl FromStr for ShipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Ok(ShipmentStatus::Draft),
            "SC_SENT" => Ok(ShipmentStatus::ScSent),
            "SIGNED" => Ok(ShipmentStatus::Signed),
            "COMPLETED" => Ok(ShipmentStatus::Completed),
            _ => Err(format!("Unknown shipment status: {}", s)),
        }
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shipment domain model, reduced to what the signing flow needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Shipment {
    pub id: Uuid,
    pub owner_org: Uuid,
    /// The importer organization expected to sign
    pub buyer_org: Option<Uuid>,
    pub internal_ref: String,
    pub status: ShipmentStatus,
    pub incoterm: String,
    pub currency: String,
    pub destination_port: Option<String>,
    pub buyer_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A share link granting login-less access to one shipment's confirmation.
///
/// Only the token digest is stored. A link is spent on the first signature
/// submission and never accepted again.
#[derive(Debug, Clone)]
pub struct MagicLink {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub token_hash: String,
    pub email_sent_to: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl MagicLink {
    /// Usable: active, unspent and not yet expired.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.used_at.is_none() && now < self.expires_at
    }
}

/// Outcome recorded for a signature event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignatureStatus {
    Approved,
    Rejected,
}

impl SignatureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureStatus::Approved => "APPROVED",
            SignatureStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for SignatureStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "APPROVED" => Ok(SignatureStatus::Approved),
            "REJECTED" => Ok(SignatureStatus::Rejected),
            _ => Err(format!("Unknown signature status: {}", s)),
        }
    }
}

/// Audit record of one approval or rejection, with caller forensics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SignatureLog {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub magic_link_id: Uuid,
    pub status: SignatureStatus,
    pub signature_name: Option<String>,
    pub rejection_comment: Option<String>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub signed_at: DateTime<Utc>,
}

/// What the caller wants to do with the confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignAction {
    Approve,
    Reject,
}

/// Request body for signature submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_sign_request"))]
pub struct SignRequest {
    pub action: SignAction,
    #[validate(length(max = 255, message = "Signature name must be at most 255 characters"))]
    pub signature_name: Option<String>,
    #[validate(length(max = 2000, message = "Rejection comment must be at most 2000 characters"))]
    pub rejection_comment: Option<String>,
}

fn validate_sign_request(request: &SignRequest) -> Result<(), validator::ValidationError> {
    let missing = match request.action {
        SignAction::Approve => request
            .signature_name
            .as_deref()
            .map_or(true, |name| name.trim().is_empty()),
        SignAction::Reject => request
            .rejection_comment
            .as_deref()
            .map_or(true, |comment| comment.trim().is_empty()),
    };

    if missing {
        let message = match request.action {
            SignAction::Approve => "Approval requires signature_name",
            SignAction::Reject => "Rejection requires rejection_comment",
        };
        return Err(validator::ValidationError::new("sign_request")
            .with_message(std::borrow::Cow::Borrowed(message)));
    }
    Ok(())
}

/// Claim prompt attached to a document view when the buyer is unclaimed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClaimPrompt {
    pub claim_token: String,
    pub claim_email: String,
    pub claim_org_name: String,
    pub claim_message: String,
}

/// Public view of a sales confirmation fetched through a share link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DocumentViewResponse {
    pub shipment: Shipment,
    pub can_sign: bool,
    pub expires_at: DateTime<Utc>,
    pub claim_required: bool,
    #[serde(flatten)]
    pub claim: Option<ClaimPrompt>,
}

/// Result of a signature submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SignResponse {
    pub message: String,
    pub status: SignatureStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_comment: Option<String>,
}
