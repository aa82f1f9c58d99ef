use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{product, product_variant};
use crate::errors::ServiceError;
use crate::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryUnit {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub sku: Option<String>,
    pub stock_quantity: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InventoryPage {
    pub items: Vec<InventoryUnit>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct InventoryListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    /// Signed quantity change; positive increases stock
    pub delta: i32,
    /// Free-text reason recorded on the movement
    pub reference: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdjustStockResponse {
    pub variant_id: Uuid,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub delta: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockMovementResponse {
    pub id: Uuid,
    pub quantity: i32,
    pub movement_type: String,
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create the inventory router
pub fn inventory_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_inventory))
        .route("/:variant_id", get(get_inventory_unit))
        .route("/:variant_id/adjust", post(adjust_stock))
        .route("/:variant_id/movements", get(list_movements))
        .route("/:variant_id/audit", get(audit_ledger))
}

/// List inventory units with their product names
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    params(InventoryListQuery),
    responses(
        (status = 200, description = "Inventory list returned", body = InventoryPage),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory(
    State(state): State<AppState>,
    Query(query): Query<InventoryListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 200);

    let paginator = product_variant::Entity::find()
        .find_also_related(product::Entity)
        .order_by_asc(product_variant::Column::CreatedAt)
        .paginate(state.db.as_ref(), limit);

    let total = paginator
        .num_items()
        .await
        .map_err(ServiceError::db_error)?;
    let rows = paginator
        .fetch_page(page - 1)
        .await
        .map_err(ServiceError::db_error)?;

    let items = rows
        .into_iter()
        .map(|(variant, product)| InventoryUnit {
            id: variant.id,
            product_id: variant.product_id,
            product_name: product.map(|p| p.name),
            sku: variant.sku,
            stock_quantity: variant.stock_quantity,
            updated_at: variant.updated_at,
        })
        .collect();

    Ok((
        StatusCode::OK,
        Json(InventoryPage {
            items,
            total,
            page,
            limit,
        }),
    ))
}

/// Fetch a single inventory unit
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{variant_id}",
    params(("variant_id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Inventory unit returned", body = InventoryUnit),
        (status = 404, description = "Unknown variant", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory_unit(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let variant = state.services.catalog.inventory_unit(variant_id).await?;
    let product = product::Entity::find_by_id(variant.product_id)
        .one(state.db.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

    Ok((
        StatusCode::OK,
        Json(InventoryUnit {
            id: variant.id,
            product_id: variant.product_id,
            product_name: product.map(|p| p.name),
            sku: variant.sku,
            stock_quantity: variant.stock_quantity,
            updated_at: variant.updated_at,
        }),
    ))
}

/// Manually adjust a variant's stock quantity
#[utoipa::path(
    post,
    path = "/api/v1/inventory/{variant_id}/adjust",
    params(("variant_id" = Uuid, Path, description = "Variant id")),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = AdjustStockResponse),
        (status = 400, description = "Invalid adjustment", body = crate::errors::ErrorResponse),
        (status = 404, description = "Unknown variant", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let applied = state
        .services
        .ledger
        .record_adjustment(variant_id, payload.delta, payload.reference)
        .await?;

    Ok((
        StatusCode::OK,
        Json(AdjustStockResponse {
            variant_id,
            previous_quantity: applied.previous_quantity,
            new_quantity: applied.new_quantity,
            delta: applied.delta,
        }),
    ))
}

/// List a variant's stock movements, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{variant_id}/movements",
    params(("variant_id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Movement log returned", body = [StockMovementResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let movements = state.services.ledger.movements(variant_id).await?;
    let response: Vec<StockMovementResponse> = movements
        .into_iter()
        .map(|m| StockMovementResponse {
            id: m.id,
            quantity: m.quantity,
            movement_type: m.movement_type,
            reference: m.reference,
            created_at: m.created_at,
        })
        .collect();
    Ok((StatusCode::OK, Json(response)))
}

/// Compare a variant's stored quantity against its replayed movement log
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{variant_id}/audit",
    params(("variant_id" = Uuid, Path, description = "Variant id")),
    responses(
        (status = 200, description = "Ledger audit returned", body = crate::services::ledger::LedgerAudit),
        (status = 404, description = "Unknown variant", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn audit_ledger(
    State(state): State<AppState>,
    Path(variant_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let audit = state.services.ledger.audit(variant_id).await?;
    Ok((StatusCode::OK, Json(audit)))
}
