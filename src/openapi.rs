use utoipa::OpenApi;

use crate::{errors, handlers, services};

/// OpenAPI document for the HTTP surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RetailSync API",
        description = "Retail management backend with marketplace stock reconciliation"
    ),
    paths(
        handlers::inventory::list_inventory,
        handlers::inventory::get_inventory_unit,
        handlers::inventory::adjust_stock,
        handlers::inventory::list_movements,
        handlers::inventory::audit_ledger,
        handlers::sync::run_sync,
        handlers::sync::list_links,
    ),
    components(schemas(
        errors::ErrorResponse,
        handlers::inventory::InventoryUnit,
        handlers::inventory::InventoryPage,
        handlers::inventory::AdjustStockRequest,
        handlers::inventory::AdjustStockResponse,
        handlers::inventory::StockMovementResponse,
        handlers::sync::RunSyncRequest,
        handlers::sync::ListingLinkResponse,
        services::ledger::LedgerAudit,
        services::sync::SyncReport,
    )),
    tags(
        (name = "inventory", description = "Stock levels and the movement ledger"),
        (name = "marketplace", description = "Listing links and sync runs")
    )
)]
pub struct ApiDoc;
