//! Signed token utilities using RS256 signing.
//!
//! Three token purposes share one codec: short-lived `access` and long-lived
//! `refresh` tokens for authenticated sessions, and single-purpose `claim`
//! tokens that let an invited importer take over a shadow account. Claim
//! tokens additionally carry the target organization and the invited email so
//! the claim flow never has to trust client-supplied identifiers.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error type for token operations.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingError(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Token claims.
///
/// `org` and `email` are only present on claim tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Target organization ID (claim tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    /// Invited email address (claim tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token identifier
    pub jti: String,
    /// What the token is good for
    pub purpose: TokenPurpose,
}

/// What a token may be used for. A token presented for any other purpose is
/// rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Access,
    Refresh,
    Claim,
}

/// Identity bundle carried by a claim token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTokenData {
    pub user_id: Uuid,
    pub org_id: Uuid,
    pub email: String,
}

/// Configuration for token generation and validation.
#[derive(Clone)]
pub struct TokenCodec {
    /// RSA private key for signing tokens
    encoding_key: EncodingKey,
    /// RSA public key for validating tokens
    decoding_key: DecodingKey,
    /// Access token expiration in seconds (default: 900 = 15 minutes)
    pub access_token_expiry_secs: i64,
    /// Refresh token expiration in seconds (default: 2592000 = 30 days)
    pub refresh_token_expiry_secs: i64,
    /// Claim token expiration in seconds (default: 604800 = 7 days)
    pub claim_token_expiry_secs: i64,
    /// Leeway in seconds for clock skew tolerance (default: 30)
    pub leeway_secs: u64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_token_expiry_secs", &self.access_token_expiry_secs)
            .field("refresh_token_expiry_secs", &self.refresh_token_expiry_secs)
            .field("claim_token_expiry_secs", &self.claim_token_expiry_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Default claim token lifetime: 7 days
pub const DEFAULT_CLAIM_TOKEN_EXPIRY_SECS: i64 = 604800;

impl TokenCodec {
    /// Creates a new TokenCodec from an RSA key pair in PEM format.
    pub fn new(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
        claim_token_expiry_secs: i64,
    ) -> Result<Self, TokenError> {
        Self::with_leeway(
            private_key_pem,
            public_key_pem,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            claim_token_expiry_secs,
            DEFAULT_LEEWAY_SECS,
        )
    }

    /// Creates a new TokenCodec with custom clock-skew leeway.
    pub fn with_leeway(
        private_key_pem: &str,
        public_key_pem: &str,
        access_token_expiry_secs: i64,
        refresh_token_expiry_secs: i64,
        claim_token_expiry_secs: i64,
        leeway_secs: u64,
    ) -> Result<Self, TokenError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(format!("Invalid private key: {}", e)))?;

        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| TokenError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            access_token_expiry_secs,
            refresh_token_expiry_secs,
            claim_token_expiry_secs,
            leeway_secs,
        })
    }

    /// Creates a TokenCodec for testing with an HS256 symmetric key.
    /// DO NOT use in production - only for tests.
    #[cfg(test)]
    pub fn new_for_testing(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_expiry_secs: 900,
            refresh_token_expiry_secs: 2592000,
            claim_token_expiry_secs: DEFAULT_CLAIM_TOKEN_EXPIRY_SECS,
            leeway_secs: 0, // Strict for testing - no leeway
        }
    }

    /// Generates an access token for the given user ID.
    pub fn generate_access_token(&self, user_id: Uuid) -> Result<(String, String), TokenError> {
        self.generate_token(
            user_id,
            None,
            None,
            TokenPurpose::Access,
            self.access_token_expiry_secs,
        )
    }

    /// Generates a refresh token for the given user ID.
    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<(String, String), TokenError> {
        self.generate_token(
            user_id,
            None,
            None,
            TokenPurpose::Refresh,
            self.refresh_token_expiry_secs,
        )
    }

    /// Generates a claim token binding a ghost user, their organization and
    /// the email the invitation was sent to.
    pub fn generate_claim_token(
        &self,
        user_id: Uuid,
        org_id: Uuid,
        email: &str,
    ) -> Result<(String, String), TokenError> {
        self.generate_token(
            user_id,
            Some(org_id),
            Some(email.to_string()),
            TokenPurpose::Claim,
            self.claim_token_expiry_secs,
        )
    }

    fn generate_token(
        &self,
        user_id: Uuid,
        org_id: Option<Uuid>,
        email: Option<String>,
        purpose: TokenPurpose,
        expiry_secs: i64,
    ) -> Result<(String, String), TokenError> {
        let now = Utc::now();
        let jti = Uuid::new_v4().to_string();
        let exp = (now + Duration::seconds(expiry_secs)).timestamp();

        let claims = Claims {
            sub: user_id.to_string(),
            org: org_id.map(|id| id.to_string()),
            email,
            exp,
            iat: now.timestamp(),
            jti: jti.clone(),
            purpose,
        };

        let header = Header::new(self.algorithm());

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingError(e.to_string()))?;

        Ok((token, jti))
    }

    /// Validates a token and returns its claims regardless of purpose.
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm());
        validation.validate_exp = true;
        // Leeway allows for minor clock differences between client and server
        validation.leeway = self.leeway_secs;

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidToken,
                _ => TokenError::DecodingError(e.to_string()),
            }
        })?;

        Ok(token_data.claims)
    }

    /// Validates an access token specifically.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.validate_token(token)?;
        if claims.purpose != TokenPurpose::Access {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    /// Validates a refresh token specifically.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.validate_token(token)?;
        if claims.purpose != TokenPurpose::Refresh {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    /// Validates a claim token and unpacks its identity bundle.
    ///
    /// A structurally valid token of any other purpose fails here, so a
    /// session token can never be replayed against the claim endpoints.
    pub fn validate_claim_token(&self, token: &str) -> Result<ClaimTokenData, TokenError> {
        let claims = self.validate_token(token)?;
        if claims.purpose != TokenPurpose::Claim {
            return Err(TokenError::InvalidToken);
        }
        claim_data(&claims)
    }

    /// Tests use HS256, production uses RS256.
    fn algorithm(&self) -> Algorithm {
        #[cfg(test)]
        {
            Algorithm::HS256
        }
        #[cfg(not(test))]
        {
            Algorithm::RS256
        }
    }
}

/// Extracts the user ID from validated claims.
pub fn extract_user_id(claims: &Claims) -> Result<Uuid, TokenError> {
    Uuid::parse_str(&claims.sub).map_err(|_| TokenError::InvalidToken)
}

/// Extracts the claim-token identity bundle from validated claims.
pub fn claim_data(claims: &Claims) -> Result<ClaimTokenData, TokenError> {
    let user_id = extract_user_id(claims)?;
    let org_id = claims
        .org
        .as_deref()
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or(TokenError::InvalidToken)?;
    let email = claims.email.clone().ok_or(TokenError::InvalidToken)?;

    Ok(ClaimTokenData {
        user_id,
        org_id,
        email,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration as StdDuration;

    fn create_test_codec() -> TokenCodec {
        TokenCodec::new_for_testing("test_secret_key_for_token_testing_12345")
    }

    #[test]
    fn test_generate_access_token() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();

        let (token, jti) = codec.generate_access_token(user_id).unwrap();

        assert!(!token.is_empty());
        assert!(!jti.is_empty());
        assert!(token.contains('.'), "JWT should have dots separating parts");
    }

    #[test]
    fn test_validate_access_token() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();

        let (token, jti) = codec.generate_access_token(user_id).unwrap();
        let claims = codec.validate_access_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.jti, jti);
        assert_eq!(claims.purpose, TokenPurpose::Access);
        assert!(claims.org.is_none());
        assert!(claims.email.is_none());
    }

    #[test]
    fn test_validate_refresh_token() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();

        let (token, _) = codec.generate_refresh_token(user_id).unwrap();
        let claims = codec.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.purpose, TokenPurpose::Refresh);
    }

    #[test]
    fn test_claim_token_round_trip() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let (token, _) = codec
            .generate_claim_token(user_id, org_id, "buyer@importer.example")
            .unwrap();
        let data = codec.validate_claim_token(&token).unwrap();

        assert_eq!(data.user_id, user_id);
        assert_eq!(data.org_id, org_id);
        assert_eq!(data.email, "buyer@importer.example");
    }

    #[test]
    fn test_claim_token_default_expiry_is_seven_days() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let (token, _) = codec
            .generate_claim_token(user_id, org_id, "buyer@importer.example")
            .unwrap();
        let claims = codec.validate_token(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_access_token_rejected_as_claim() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();

        let (token, _) = codec.generate_access_token(user_id).unwrap();
        let result = codec.validate_claim_token(&token);

        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_claim_token_rejected_as_access() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let (token, _) = codec
            .generate_claim_token(user_id, org_id, "buyer@importer.example")
            .unwrap();
        let result = codec.validate_access_token(&token);

        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_access_token_rejected_as_refresh() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();

        let (token, _) = codec.generate_access_token(user_id).unwrap();
        let result = codec.validate_refresh_token(&token);

        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_expired_claim_token() {
        let mut codec = create_test_codec();
        codec.claim_token_expiry_secs = 1;
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let (token, _) = codec
            .generate_claim_token(user_id, org_id, "buyer@importer.example")
            .unwrap();

        sleep(StdDuration::from_secs(2));

        let result = codec.validate_claim_token(&token);
        assert!(
            matches!(result, Err(TokenError::TokenExpired)),
            "Expected TokenExpired, got: {:?}",
            result
        );
    }

    #[test]
    fn test_tampered_token_rejected() {
        let codec = create_test_codec();
        let other = TokenCodec::new_for_testing("a_different_secret_entirely_67890");
        let user_id = Uuid::new_v4();
        let org_id = Uuid::new_v4();

        let (token, _) = other
            .generate_claim_token(user_id, org_id, "buyer@importer.example")
            .unwrap();
        let result = codec.validate_claim_token(&token);

        assert!(matches!(result, Err(TokenError::InvalidToken)));
    }

    #[test]
    fn test_malformed_token() {
        let codec = create_test_codec();

        assert!(codec.validate_token("not_a_jwt").is_err());
        assert!(codec.validate_token("").is_err());
        assert!(codec.validate_token("a.b.c").is_err());
    }

    #[test]
    fn test_extract_user_id() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();

        let (token, _) = codec.generate_access_token(user_id).unwrap();
        let claims = codec.validate_access_token(&token).unwrap();

        assert_eq!(extract_user_id(&claims).unwrap(), user_id);
    }

    #[test]
    fn test_unique_jti_per_token() {
        let codec = create_test_codec();
        let user_id = Uuid::new_v4();

        let (_, jti1) = codec.generate_access_token(user_id).unwrap();
        let (_, jti2) = codec.generate_access_token(user_id).unwrap();

        assert_ne!(jti1, jti2, "Each token should have unique jti");
    }

    #[test]
    fn test_purpose_serialization() {
        assert_eq!(
            serde_json::to_string(&TokenPurpose::Access).unwrap(),
            "\"access\""
        );
        assert_eq!(
            serde_json::to_string(&TokenPurpose::Refresh).unwrap(),
            "\"refresh\""
        );
        assert_eq!(
            serde_json::to_string(&TokenPurpose::Claim).unwrap(),
            "\"claim\""
        );
    }

    #[test]
    fn test_token_error_display() {
        assert!(format!("{}", TokenError::TokenExpired).contains("expired"));
        assert!(format!("{}", TokenError::InvalidToken).contains("Invalid"));
        assert!(format!("{}", TokenError::EncodingError("x".to_string())).contains("encode"));
    }
}
