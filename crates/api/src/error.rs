use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad signature, undecodable payload, past expiry or wrong purpose.
    /// Business-state problems (already claimed, suspended) are separate
    /// variants; a structurally valid token never maps here.
    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Account already claimed")]
    AlreadyClaimed,

    #[error("Organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Control signal for the signing flow: the buyer organization must be
    /// claimed before any signature is accepted.
    #[error("Account must be claimed before signing")]
    ClaimRequired,

    #[error("Organization is suspended")]
    OrganizationSuspended,

    /// Expired, spent or unknown share link.
    #[error("This link has expired or was already used")]
    LinkInvalid,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            ApiError::TokenInvalid => (
                StatusCode::BAD_REQUEST,
                "token_invalid",
                "The link is invalid or has expired".into(),
            ),
            ApiError::AlreadyClaimed => (
                StatusCode::CONFLICT,
                "already_claimed",
                "This account has already been claimed".into(),
            ),
            ApiError::OrganizationNotFound(msg) => {
                (StatusCode::NOT_FOUND, "organization_not_found", msg.clone())
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::ClaimRequired => (
                StatusCode::FORBIDDEN,
                "claim_required",
                "You must activate your account before signing. Reload the page for instructions."
                    .into(),
            ),
            ApiError::OrganizationSuspended => (
                StatusCode::FORBIDDEN,
                "organization_suspended",
                "This organization is suspended".into(),
            ),
            ApiError::LinkInvalid => (
                StatusCode::FORBIDDEN,
                "link_invalid",
                "This link has expired or was already used".into(),
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".into()),
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => ApiError::Conflict("Resource already exists".into()),
                        "23503" => ApiError::NotFound("Referenced resource not found".into()),
                        _ => ApiError::Internal(format!("Database error: {}", db_err)),
                    }
                } else {
                    ApiError::Internal(format!("Database error: {}", db_err))
                }
            }
            _ => ApiError::Internal(format!("Database error: {}", err)),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
            })
            .collect();

        let message = match messages.as_slice() {
            [single] => single.clone(),
            many => format!("{} validation errors", many.len()),
        };

        ApiError::Validation(message)
    }
}

impl From<shared::token::TokenError> for ApiError {
    fn from(err: shared::token::TokenError) -> Self {
        match err {
            shared::token::TokenError::InvalidKey(msg) => ApiError::Internal(msg),
            shared::token::TokenError::EncodingError(msg) => ApiError::Internal(msg),
            _ => ApiError::TokenInvalid,
        }
    }
}

impl From<shared::password::PasswordError> for ApiError {
    fn from(err: shared::password::PasswordError) -> Self {
        match err {
            shared::password::PasswordError::TooShort => ApiError::Validation(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use shared::token::TokenError;

    #[test]
    fn test_token_invalid_is_bad_request() {
        let response = ApiError::TokenInvalid.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_already_claimed_is_conflict() {
        let response = ApiError::AlreadyClaimed.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_claim_required_is_forbidden() {
        let response = ApiError::ClaimRequired.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_suspended_is_forbidden() {
        let response = ApiError::OrganizationSuspended.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_organization_not_found_is_404() {
        let response = ApiError::OrganizationNotFound("gone".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_link_invalid_is_forbidden() {
        let response = ApiError::LinkInvalid.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = ApiError::Validation("bad input".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_unauthorized_and_rate_limited() {
        assert_eq!(
            ApiError::Unauthorized("no token".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::RateLimited.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_internal_is_redacted() {
        let response = ApiError::Internal("secret database dsn".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_token_error_mapping() {
        assert!(matches!(
            ApiError::from(TokenError::TokenExpired),
            ApiError::TokenInvalid
        ));
        assert!(matches!(
            ApiError::from(TokenError::InvalidToken),
            ApiError::TokenInvalid
        ));
        assert!(matches!(
            ApiError::from(TokenError::InvalidKey("bad pem".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_sqlx_unique_violation_maps_to_conflict() {
        // RowNotFound is the only sqlx variant constructible without a live DB
        assert!(matches!(
            ApiError::from(sqlx::Error::RowNotFound),
            ApiError::NotFound(_)
        ));
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(
            format!("{}", ApiError::AlreadyClaimed),
            "Account already claimed"
        );
        assert_eq!(
            format!("{}", ApiError::ClaimRequired),
            "Account must be claimed before signing"
        );
        assert_eq!(format!("{}", ApiError::RateLimited), "Rate limited");
    }
}
