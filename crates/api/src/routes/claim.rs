//! Account-claim endpoints.
//!
//! Public endpoints reached from the invitation email and the signing page.

use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use domain::models::claim::{ClaimAccountRequest, ClaimAccountResponse, VerifyClaimResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_account_claimed;
use crate::services::claim::ClaimService;

/// Check a claim token and show who it belongs to.
///
/// GET /api/auth/claim/verify/:token
pub async fn verify_claim(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<VerifyClaimResponse>, ApiError> {
    let service = ClaimService::new(state.pool.clone(), state.codec.clone(), state.email.clone());
    let response = service.verify_claim_token(&token).await?;
    Ok(Json(response))
}

/// Claim the account: set a password and activate the organization.
///
/// POST /api/auth/claim/:token
pub async fn claim_account(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ClaimAccountRequest>,
) -> Result<Json<ClaimAccountResponse>, ApiError> {
    request.validate()?;

    let service = ClaimService::new(state.pool.clone(), state.codec.clone(), state.email.clone());
    let response = service.claim_account(&token, &request).await?;

    record_account_claimed();

    Ok(Json(response))
}
