//! Request and response types for the account-claim and login flows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::user::UserSummary;

/// Response to a claim-token verification probe. Shown to the importer
/// before they pick a password.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VerifyClaimResponse {
    pub valid: bool,
    pub email: String,
    pub organization_name: Option<String>,
    pub organization_id: Option<Uuid>,
}

/// Request body for claiming an account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ClaimAccountRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    /// Display name to set on the claiming user; blank keeps the current one
    #[serde(default)]
    pub name: Option<String>,
}

/// Successful claim: the account is active and the caller is logged in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClaimAccountResponse {
    pub success: bool,
    pub message: String,
    pub access: String,
    pub refresh: String,
    pub user: UserSummary,
}

/// Request body for email + password login.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_request_password_policy() {
        let ok = ClaimAccountRequest {
            password: "long-enough".to_string(),
            name: Some("Maria Keller".to_string()),
        };
        assert!(ok.validate().is_ok());

        let short = ClaimAccountRequest {
            password: "1234567".to_string(),
            name: None,
        };
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_claim_request_name_defaults_to_none() {
        let request: ClaimAccountRequest =
            serde_json::from_str(r#"{"password":"long-enough"}"#).unwrap();
        assert!(request.name.is_none());
    }

    #[test]
    fn test_login_request_validation() {
        let ok = LoginRequest {
            email: "buyer@importer.example".to_string(),
            password: "secret".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = LoginRequest {
            email: "not-an-email".to_string(),
            password: String::new(),
        };
        assert!(bad.validate().is_err());
    }
}
