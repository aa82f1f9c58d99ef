use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::services::reconcile::SyncDirection;
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RunSyncRequest {
    /// "push" (local authoritative) or "pull" (marketplace authoritative)
    pub direction: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListingLinkResponse {
    pub id: Uuid,
    pub variant_id: Uuid,
    pub sku: Option<String>,
    pub platform: String,
    pub remote_item_id: String,
    pub remote_variation_id: Option<String>,
    pub stock_synced: Option<i32>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub status: String,
}

/// Create the marketplace router
pub fn marketplace_router() -> Router<AppState> {
    Router::new()
        .route("/sync", post(run_sync))
        .route("/links", get(list_links))
}

/// Run a stock synchronization pass against the marketplace
#[utoipa::path(
    post,
    path = "/api/v1/marketplace/sync",
    request_body = RunSyncRequest,
    responses(
        (status = 200, description = "Sync pass finished", body = crate::services::sync::SyncReport),
        (status = 400, description = "Invalid direction", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "marketplace"
)]
pub async fn run_sync(
    State(state): State<AppState>,
    Json(payload): Json<RunSyncRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let direction = SyncDirection::from_str(&payload.direction).ok_or_else(|| {
        ServiceError::InvalidInput(format!(
            "unknown sync direction '{}', expected 'push' or 'pull'",
            payload.direction
        ))
    })?;

    let report = state.services.sync.run_sync(direction).await?;
    Ok((StatusCode::OK, Json(report)))
}

/// List marketplace listing links for the configured platform
#[utoipa::path(
    get,
    path = "/api/v1/marketplace/links",
    responses(
        (status = 200, description = "Listing links returned", body = [ListingLinkResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "marketplace"
)]
pub async fn list_links(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let linked = state
        .services
        .catalog
        .listing_links(&state.config.marketplace.platform)
        .await?;

    let response: Vec<ListingLinkResponse> = linked
        .into_iter()
        .map(|unit| ListingLinkResponse {
            id: unit.link.id,
            variant_id: unit.variant.id,
            sku: unit.variant.sku,
            platform: unit.link.platform,
            remote_item_id: unit.link.remote_item_id,
            remote_variation_id: unit.link.remote_variation_id,
            stock_synced: unit.link.stock_synced,
            last_sync_at: unit.link.last_sync_at,
            status: unit.link.status,
        })
        .collect();

    Ok((StatusCode::OK, Json(response)))
}
