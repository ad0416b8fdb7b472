//! Organization domain models.
//!
//! Organizations move through a small lifecycle: exporters pre-create their
//! importers as `Unclaimed` shadow accounts, a successful claim activates
//! them, and platform operators can suspend either kind. `Suspended` is
//! terminal as far as this service is concerned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrgStatus {
    Active,
    Unclaimed,
    Suspended,
}

impl OrgStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgStatus::Active => "ACTIVE",
            OrgStatus::Unclaimed => "UNCLAIMED",
            OrgStatus::Suspended => "SUSPENDED",
        }
    }

    /// Whether this status may transition to `target` within this service.
    ///
    /// The only transition the claim flow performs is `Unclaimed -> Active`.
    /// Suspension is applied externally and has no outbound transition here.
    pub fn can_transition_to(&self, target: OrgStatus) -> bool {
        matches!(
            (self, target),
            (OrgStatus::Unclaimed, OrgStatus::Active)
                | (OrgStatus::Unclaimed, OrgStatus::Suspended)
                | (OrgStatus::Active, OrgStatus::Suspended)
        )
    }

    /// Whether members of an organization in this status may act on
    /// documents.
    pub fn is_claimable(&self) -> bool {
        matches!(self, OrgStatus::Unclaimed)
    }
}

impl FromStr for OrgStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Ok(OrgStatus::Active),
            "UNCLAIMED" => Ok(OrgStatus::Unclaimed),
            "SUSPENDED" => Ok(OrgStatus::Suspended),
            _ => Err(format!("Unknown organization status: {}", s)),
        }
    }
}

impl std::fmt::Display for OrgStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Organization domain model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    /// National tax identifier (RUT, VAT number, EIN, ...)
    pub tax_id: Option<String>,
    pub country: String,
    pub status: OrgStatus,
    pub contact_email: Option<String>,
    /// The exporter organization that pre-created this shadow account, if any
    pub created_by_org: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to add a client to the exporter's agenda, pre-creating a shadow
/// organization when the client is not yet on the platform.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateClientRequest {
    #[validate(length(min = 2, max = 255, message = "Name must be 2-255 characters"))]
    pub name: String,
    #[validate(length(min = 2, max = 100, message = "Country must be 2-100 characters"))]
    pub country: String,
    #[validate(custom(function = "validate_tax_id"))]
    pub tax_id: Option<String>,
    /// Mandatory: the invitation and the ghost user both hang off this email
    #[validate(email(message = "Invalid contact email format"))]
    pub contact_email: String,
    #[validate(length(max = 100, message = "Alias must be at most 100 characters"))]
    pub alias: Option<String>,
}

/// Validate tax id format: alphanumeric with dots and hyphens, 4-50 chars.
fn validate_tax_id(tax_id: &str) -> Result<(), validator::ValidationError> {
    if TAX_ID_REGEX.is_match(tax_id) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("tax_id_format").with_message(
            std::borrow::Cow::Borrowed(
                "Tax ID must be 4-50 alphanumeric characters, dots or hyphens",
            ),
        ))
    }
}

/// Response for client creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateClientResponse {
    pub id: Uuid,
    pub name: String,
    pub status: OrgStatus,
    /// True when the client already existed and only the agenda link was added
    pub was_existing: bool,
    pub message: String,
}

lazy_static::lazy_static! {
    pub static ref TAX_ID_REGEX: regex::Regex =
        regex::Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.\-]{2,48}[A-Za-z0-9]$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateClientRequest {
        CreateClientRequest {
            name: "Atlantic Foods GmbH".to_string(),
            country: "Germany".to_string(),
            tax_id: Some("DE-811907980".to_string()),
            contact_email: "purchasing@atlanticfoods.example".to_string(),
            alias: Some("Atlantic".to_string()),
        }
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&OrgStatus::Unclaimed).unwrap(),
            "\"UNCLAIMED\""
        );
        let status: OrgStatus = serde_json::from_str("\"SUSPENDED\"").unwrap();
        assert_eq!(status, OrgStatus::Suspended);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(OrgStatus::from_str("active").unwrap(), OrgStatus::Active);
        assert_eq!(
            OrgStatus::from_str("UNCLAIMED").unwrap(),
            OrgStatus::Unclaimed
        );
        assert!(OrgStatus::from_str("dormant").is_err());
    }

    #[test]
    fn test_transitions() {
        assert!(OrgStatus::Unclaimed.can_transition_to(OrgStatus::Active));
        assert!(OrgStatus::Unclaimed.can_transition_to(OrgStatus::Suspended));
        assert!(OrgStatus::Active.can_transition_to(OrgStatus::Suspended));

        assert!(!OrgStatus::Active.can_transition_to(OrgStatus::Unclaimed));
        assert!(!OrgStatus::Suspended.can_transition_to(OrgStatus::Active));
        assert!(!OrgStatus::Suspended.can_transition_to(OrgStatus::Unclaimed));
    }

    #[test]
    fn test_create_client_request_validation() {
        assert!(valid_request().validate().is_ok());

        let mut bad_email = valid_request();
        bad_email.contact_email = "not-an-email".to_string();
        assert!(bad_email.validate().is_err());

        let mut bad_name = valid_request();
        bad_name.name = "x".to_string();
        assert!(bad_name.validate().is_err());

        let mut bad_tax_id = valid_request();
        bad_tax_id.tax_id = Some("a!".to_string());
        assert!(bad_tax_id.validate().is_err());

        let mut no_tax_id = valid_request();
        no_tax_id.tax_id = None;
        assert!(no_tax_id.validate().is_ok());
    }

    #[test]
    fn test_create_client_request_accepts_generated_emails() {
        use fake::faker::company::en::CompanyName;
        use fake::faker::internet::en::SafeEmail;
        use fake::Fake;

        for _ in 0..20 {
            let request = CreateClientRequest {
                name: CompanyName().fake(),
                country: "Chile".to_string(),
                tax_id: None,
                contact_email: SafeEmail().fake(),
                alias: None,
            };
            assert!(request.validate().is_ok(), "rejected {:?}", request);
        }
    }

    #[test]
    fn test_tax_id_regex() {
        assert!(TAX_ID_REGEX.is_match("76.123.456-7"));
        assert!(TAX_ID_REGEX.is_match("DE811907980"));
        assert!(!TAX_ID_REGEX.is_match("ab"));
        assert!(!TAX_ID_REGEX.is_match(".7612"));
        assert!(!TAX_ID_REGEX.is_match("7612."));
        assert!(!TAX_ID_REGEX.is_match("76 123"));
    }

    #[test]
    fn test_organization_serialization() {
        let org = Organization {
            id: Uuid::nil(),
            name: "Salmones del Sur S.A.".to_string(),
            tax_id: Some("76.123.456-7".to_string()),
            country: "Chile".to_string(),
            status: OrgStatus::Active,
            contact_email: Some("ops@salmonesdelsur.example".to_string()),
            created_by_org: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&org).unwrap();
        assert!(json.contains("\"status\":\"ACTIVE\""));
        assert!(json.contains("\"tax_id\":\"76.123.456-7\""));
    }
}
