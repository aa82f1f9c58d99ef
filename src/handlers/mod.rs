pub mod inventory;
pub mod sync;

use std::sync::Arc;

use axum::Router;

use crate::db::DbPool;
use crate::events::EventSender;
use crate::services::{
    catalog::{CatalogStore, SqlCatalogStore},
    ledger::StockLedgerService,
    marketplace::MarketplaceClient,
    reconcile::ReconciliationEngine,
    sync::MarketplaceSyncService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<dyn CatalogStore>,
    pub ledger: StockLedgerService,
    pub sync: Arc<MarketplaceSyncService>,
}

impl AppServices {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        marketplace: Arc<dyn MarketplaceClient>,
        platform: String,
    ) -> Self {
        let catalog: Arc<dyn CatalogStore> = Arc::new(SqlCatalogStore::new(db_pool));
        let ledger = StockLedgerService::new(catalog.clone(), event_sender.clone());
        let engine =
            ReconciliationEngine::new(catalog.clone(), marketplace.clone(), ledger.clone());
        let sync = Arc::new(MarketplaceSyncService::new(
            catalog.clone(),
            marketplace,
            engine,
            event_sender,
            platform,
        ));

        Self {
            catalog,
            ledger,
            sync,
        }
    }
}

/// Compose the versioned API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1/inventory", inventory::inventory_router())
        .nest("/api/v1/marketplace", sync::marketplace_router())
}
