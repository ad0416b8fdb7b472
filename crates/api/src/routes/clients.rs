//! Client agenda endpoint for exporters.

use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use domain::models::organization::{CreateClientRequest, CreateClientResponse};
use persistence::repositories::OrganizationRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_client_created;
use crate::services::auth::AuthService;
use crate::services::claim::ClaimService;

/// Add a client to the caller's agenda, pre-creating a shadow organization
/// when the client is not yet on the platform.
///
/// POST /api/clients
pub async fn create_client(
    State(state): State<AppState>,
    auth: UserAuth,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<CreateClientResponse>), ApiError> {
    request.validate()?;

    let auth_service = AuthService::new(state.pool.clone(), state.codec.clone());
    let caller = auth_service.load_user(auth.user_id).await?;

    let Some(exporter_org_id) = caller.organization_id else {
        return Err(ApiError::Validation(
            "Your account is not attached to an organization".to_string(),
        ));
    };

    let orgs = OrganizationRepository::new(state.pool.clone());
    let exporter = orgs
        .find_by_id(exporter_org_id)
        .await?
        .ok_or_else(|| ApiError::OrganizationNotFound("Organization not found".to_string()))?;

    let service = ClaimService::new(state.pool.clone(), state.codec.clone(), state.email.clone());
    let response = service.create_shadow_client(&exporter, &request).await?;

    record_client_created(response.was_existing);

    let status = if response.was_existing {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    Ok((status, Json(response)))
}
