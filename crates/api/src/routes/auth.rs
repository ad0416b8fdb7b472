//! Login and session endpoints for claimed accounts.

use axum::{extract::State, Json};
use validator::Validate;

use domain::models::claim::{LoginRequest, LoginResponse};
use domain::models::user::UserSummary;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::services::auth::AuthService;

/// Login with email and password.
///
/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let service = AuthService::new(state.pool.clone(), state.codec.clone());
    let response = service.login(&request.email, &request.password).await?;

    Ok(Json(response))
}

/// Profile of the authenticated user.
///
/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: UserAuth,
) -> Result<Json<UserSummary>, ApiError> {
    let service = AuthService::new(state.pool.clone(), state.codec.clone());
    let summary = service.current_user(auth.user_id).await?;

    Ok(Json(summary))
}
