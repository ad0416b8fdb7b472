//! Public document-signing endpoints reached through magic links.

use axum::{
    extract::{ConnectInfo, Path, State},
    http::HeaderMap,
    Json,
};
use std::net::SocketAddr;
use uuid::Uuid;
use validator::Validate;

use domain::models::document::{DocumentViewResponse, SignRequest, SignResponse};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::record_signature;
use crate::services::documents::DocumentService;

/// View a sales confirmation through its share link.
///
/// GET /api/sign/:shipment_id/:token
pub async fn view_document(
    State(state): State<AppState>,
    Path((shipment_id, token)): Path<(Uuid, String)>,
) -> Result<Json<DocumentViewResponse>, ApiError> {
    let service =
        DocumentService::new(state.pool.clone(), state.codec.clone(), state.email.clone());
    let response = service.view_document(shipment_id, &token).await?;

    Ok(Json(response))
}

/// Submit a signature decision for a sales confirmation.
///
/// POST /api/sign/:shipment_id/:token/submit
pub async fn submit_signature(
    State(state): State<AppState>,
    Path((shipment_id, token)): Path<(Uuid, String)>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<SignRequest>,
) -> Result<Json<SignResponse>, ApiError> {
    request.validate()?;

    let ip_address = client_ip(&headers, peer);
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let service =
        DocumentService::new(state.pool.clone(), state.codec.clone(), state.email.clone());
    let response = service
        .submit_signature(
            shipment_id,
            &token,
            &request,
            &ip_address,
            user_agent.as_deref(),
        )
        .await?;

    record_signature(response.status.as_str());

    Ok(Json(response))
}

/// First hop of X-Forwarded-For when behind a proxy, peer address otherwise.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| peer.ip().to_string())
}
