//! In-memory fakes for the catalog store and the marketplace client, plus a
//! harness wiring them into the sync service the way `main.rs` wires the
//! production implementations.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::mpsc;
use uuid::Uuid;

use retailsync_api::{
    entities::{listing_link, product_variant, stock_movement},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        catalog::{
            AppliedMutation, CatalogStore, LinkedUnit, ListingLinkPatch, QuantityWrite,
            StockMutation,
        },
        ledger::StockLedgerService,
        marketplace::{MarketplaceClient, RemoteItem, RemoteVariation},
        reconcile::ReconciliationEngine,
        sync::MarketplaceSyncService,
    },
};

pub const PLATFORM: &str = "marketplace";

#[derive(Default)]
struct StoreState {
    variants: HashMap<Uuid, product_variant::Model>,
    links: Vec<listing_link::Model>,
    movements: Vec<stock_movement::Model>,
    stock_mutations: usize,
    link_updates: usize,
}

/// In-memory [`CatalogStore`] with write counters for NoOp assertions.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    state: Mutex<StoreState>,
}

impl InMemoryCatalogStore {
    pub fn insert_variant(&self, variant: product_variant::Model) {
        self.state
            .lock()
            .unwrap()
            .variants
            .insert(variant.id, variant);
    }

    pub fn insert_link(&self, link: listing_link::Model) {
        self.state.lock().unwrap().links.push(link);
    }

    pub fn variant(&self, variant_id: Uuid) -> product_variant::Model {
        self.state.lock().unwrap().variants[&variant_id].clone()
    }

    pub fn link(&self, link_id: Uuid) -> listing_link::Model {
        self.state
            .lock()
            .unwrap()
            .links
            .iter()
            .find(|l| l.id == link_id)
            .expect("link not found")
            .clone()
    }

    pub fn stock_mutations(&self) -> usize {
        self.state.lock().unwrap().stock_mutations
    }

    pub fn link_updates(&self) -> usize {
        self.state.lock().unwrap().link_updates
    }

    pub fn movement_count(&self) -> usize {
        self.state.lock().unwrap().movements.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn listing_links(&self, platform: &str) -> Result<Vec<LinkedUnit>, ServiceError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .links
            .iter()
            .filter(|link| link.platform == platform)
            .filter_map(|link| {
                state.variants.get(&link.variant_id).map(|variant| LinkedUnit {
                    link: link.clone(),
                    variant: variant.clone(),
                })
            })
            .collect())
    }

    async fn inventory_unit(
        &self,
        variant_id: Uuid,
    ) -> Result<product_variant::Model, ServiceError> {
        self.state
            .lock()
            .unwrap()
            .variants
            .get(&variant_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("variant {} not found", variant_id)))
    }

    async fn mutate_stock(
        &self,
        variant_id: Uuid,
        mutation: StockMutation,
    ) -> Result<AppliedMutation, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let variant = state
            .variants
            .get_mut(&variant_id)
            .ok_or_else(|| ServiceError::NotFound(format!("variant {} not found", variant_id)))?;

        let previous = variant.stock_quantity;
        let new_quantity = match mutation.write {
            QuantityWrite::Set(quantity) => quantity,
            QuantityWrite::Delta(delta) => previous + delta,
        };
        let delta = new_quantity - previous;
        variant.stock_quantity = new_quantity;
        variant.updated_at = Some(Utc::now());

        state.movements.push(stock_movement::Model {
            id: Uuid::new_v4(),
            variant_id,
            quantity: delta,
            movement_type: mutation.kind.as_str().to_string(),
            reference: mutation.reference,
            created_at: Utc::now(),
        });
        state.stock_mutations += 1;

        Ok(AppliedMutation {
            previous_quantity: previous,
            new_quantity,
            delta,
        })
    }

    async fn update_listing_link(
        &self,
        link_id: Uuid,
        patch: ListingLinkPatch,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        let link = state
            .links
            .iter_mut()
            .find(|l| l.id == link_id)
            .ok_or_else(|| ServiceError::NotFound(format!("listing link {} not found", link_id)))?;

        if let Some(variation_id) = patch.remote_variation_id {
            link.remote_variation_id = Some(variation_id);
        }
        if let Some(stock_synced) = patch.stock_synced {
            link.stock_synced = Some(stock_synced);
        }
        if let Some(last_sync_at) = patch.last_sync_at {
            link.last_sync_at = Some(last_sync_at);
        }
        link.updated_at = Some(Utc::now());
        state.link_updates += 1;
        Ok(())
    }

    async fn movements(
        &self,
        variant_id: Uuid,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .movements
            .iter()
            .filter(|m| m.variant_id == variant_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct MarketState {
    items: HashMap<String, RemoteItem>,
    unavailable: HashSet<String>,
    item_writes: Vec<(String, i32)>,
    variation_writes: Vec<(String, String, i32)>,
}

/// In-memory [`MarketplaceClient`] recording every quantity write.
#[derive(Default)]
pub struct InMemoryMarketplace {
    state: Mutex<MarketState>,
}

impl InMemoryMarketplace {
    pub fn insert_item(&self, item: RemoteItem) {
        self.state.lock().unwrap().items.insert(item.id.clone(), item);
    }

    /// Make an item's fetch fail; it will be absent from multiget results.
    pub fn make_unavailable(&self, item_id: &str) {
        self.state
            .lock()
            .unwrap()
            .unavailable
            .insert(item_id.to_string());
    }

    pub fn item_writes(&self) -> Vec<(String, i32)> {
        self.state.lock().unwrap().item_writes.clone()
    }

    pub fn variation_writes(&self) -> Vec<(String, String, i32)> {
        self.state.lock().unwrap().variation_writes.clone()
    }

    pub fn write_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.item_writes.len() + state.variation_writes.len()
    }
}

#[async_trait]
impl MarketplaceClient for InMemoryMarketplace {
    async fn items(&self, ids: &[String]) -> Result<Vec<RemoteItem>, ServiceError> {
        let state = self.state.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| !state.unavailable.contains(*id))
            .filter_map(|id| state.items.get(id).cloned())
            .collect())
    }

    async fn set_item_quantity(&self, item_id: &str, quantity: i32) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .items
            .get_mut(item_id)
            .ok_or_else(|| ServiceError::ExternalApiError(format!("unknown item {}", item_id)))?;
        item.available_quantity = quantity;
        state.item_writes.push((item_id.to_string(), quantity));
        Ok(())
    }

    async fn set_variation_quantity(
        &self,
        item_id: &str,
        variation_id: &str,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        let item = state
            .items
            .get_mut(item_id)
            .ok_or_else(|| ServiceError::ExternalApiError(format!("unknown item {}", item_id)))?;
        let variation = item
            .variations
            .iter_mut()
            .find(|v| v.id == variation_id)
            .ok_or_else(|| {
                ServiceError::ExternalApiError(format!(
                    "unknown variation {} on item {}",
                    variation_id, item_id
                ))
            })?;
        variation.available_quantity = quantity;
        state
            .variation_writes
            .push((item_id.to_string(), variation_id.to_string(), quantity));
        Ok(())
    }
}

/// Sync service wired against the in-memory fakes.
pub struct SyncHarness {
    pub store: Arc<InMemoryCatalogStore>,
    pub marketplace: Arc<InMemoryMarketplace>,
    pub ledger: StockLedgerService,
    pub sync: MarketplaceSyncService,
    _event_rx: mpsc::Receiver<Event>,
}

pub fn harness() -> SyncHarness {
    let store = Arc::new(InMemoryCatalogStore::default());
    let marketplace = Arc::new(InMemoryMarketplace::default());
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = EventSender::new(event_tx);

    let catalog: Arc<dyn CatalogStore> = store.clone();
    let client: Arc<dyn MarketplaceClient> = marketplace.clone();
    let ledger = StockLedgerService::new(catalog.clone(), event_sender.clone());
    let engine = ReconciliationEngine::new(catalog.clone(), client.clone(), ledger.clone());
    let sync = MarketplaceSyncService::new(
        catalog,
        client,
        engine,
        event_sender,
        PLATFORM.to_string(),
    );

    SyncHarness {
        store,
        marketplace,
        ledger,
        sync,
        _event_rx: event_rx,
    }
}

// ---- builders ----

pub fn variant(sku: Option<&str>, stock_quantity: i32) -> product_variant::Model {
    product_variant::Model {
        id: Uuid::new_v4(),
        product_id: Uuid::new_v4(),
        sku: sku.map(str::to_string),
        stock_quantity,
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn link_for(
    variant: &product_variant::Model,
    remote_item_id: &str,
    remote_variation_id: Option<&str>,
    stock_synced: Option<i32>,
) -> listing_link::Model {
    listing_link::Model {
        id: Uuid::new_v4(),
        variant_id: variant.id,
        platform: PLATFORM.to_string(),
        remote_item_id: remote_item_id.to_string(),
        remote_variation_id: remote_variation_id.map(str::to_string),
        stock_synced,
        last_sync_at: None,
        status: "active".to_string(),
        created_at: Utc::now(),
        updated_at: None,
    }
}

pub fn remote_variation(id: &str, quantity: i32, seller_sku: Option<&str>) -> RemoteVariation {
    RemoteVariation {
        id: id.to_string(),
        available_quantity: quantity,
        seller_sku: seller_sku.map(str::to_string),
    }
}

pub fn remote_item(id: &str, quantity: i32, variations: Vec<RemoteVariation>) -> RemoteItem {
    RemoteItem {
        id: id.to_string(),
        title: format!("Item {}", id),
        available_quantity: quantity,
        variations,
    }
}
