use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    entities::listing_link::ListingStatus,
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        catalog::{CatalogStore, LinkedUnit, ListingLinkPatch},
        identity::{self, Resolution},
        marketplace::{MarketplaceClient, RemoteItem},
        reconcile::{ReconcileOutcome, ReconciliationEngine, SyncDirection},
    },
};

/// Per-run result of a marketplace sync pass. Not persisted.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct SyncReport {
    /// Units whose quantity was actually moved.
    pub synced: usize,
    /// Units considered by the run.
    pub total: usize,
    /// One entry per skipped or failed unit.
    pub errors: Vec<String>,
}

/// Drives a full synchronization pass over all listing links for the
/// configured platform. Units are processed sequentially; remote items are
/// batch-fetched ahead of the loop.
#[derive(Clone)]
pub struct MarketplaceSyncService {
    store: Arc<dyn CatalogStore>,
    marketplace: Arc<dyn MarketplaceClient>,
    engine: ReconciliationEngine,
    event_sender: EventSender,
    platform: String,
}

impl MarketplaceSyncService {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        marketplace: Arc<dyn MarketplaceClient>,
        engine: ReconciliationEngine,
        event_sender: EventSender,
        platform: String,
    ) -> Self {
        Self {
            store,
            marketplace,
            engine,
            event_sender,
            platform,
        }
    }

    /// Run one sync pass. Only a failure to load the listing links aborts
    /// the run; every per-unit failure is recorded in the report and the
    /// loop continues.
    #[instrument(skip(self), fields(platform = %self.platform, direction = direction.as_str()))]
    pub async fn run_sync(&self, direction: SyncDirection) -> Result<SyncReport, ServiceError> {
        let links = self.store.listing_links(&self.platform).await?;

        // Closed listings no longer accept quantity writes and are not
        // candidates.
        let candidates: Vec<LinkedUnit> = links
            .into_iter()
            .filter(|linked| linked.link.status() != Some(ListingStatus::Closed))
            .collect();

        let mut report = SyncReport {
            total: candidates.len(),
            ..Default::default()
        };

        let remote_items = self.fetch_remote_items(&candidates).await;

        for linked in &candidates {
            match self.sync_unit(direction, linked, &remote_items).await {
                Ok(ReconcileOutcome::Applied) => report.synced += 1,
                Ok(ReconcileOutcome::NoOp) => {}
                Err(message) => report.errors.push(message),
            }
        }

        info!(
            synced = report.synced,
            total = report.total,
            failed = report.errors.len(),
            "sync pass finished"
        );
        if let Err(e) = self
            .event_sender
            .send(Event::SyncCompleted {
                platform: self.platform.clone(),
                direction: direction.as_str().to_string(),
                synced: report.synced,
                total: report.total,
                failed: report.errors.len(),
                finished_at: Utc::now(),
            })
            .await
        {
            warn!(error = %e, "failed to publish sync completion event");
        }

        Ok(report)
    }

    /// Batch-fetch every distinct remote item referenced by the candidates.
    /// Items that cannot be fetched are simply absent; the per-unit loop
    /// reports them individually.
    async fn fetch_remote_items(&self, candidates: &[LinkedUnit]) -> HashMap<String, RemoteItem> {
        let mut ids: Vec<String> = Vec::new();
        for linked in candidates {
            let id = linked.link.remote_item_id.trim();
            if !id.is_empty() && !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        if ids.is_empty() {
            return HashMap::new();
        }

        match self.marketplace.items(&ids).await {
            Ok(items) => items.into_iter().map(|item| (item.id.clone(), item)).collect(),
            Err(e) => {
                warn!(error = %e, "batch item fetch failed");
                HashMap::new()
            }
        }
    }

    /// Process one linked unit; any failure becomes a report entry.
    async fn sync_unit(
        &self,
        direction: SyncDirection,
        linked: &LinkedUnit,
        remote_items: &HashMap<String, RemoteItem>,
    ) -> Result<ReconcileOutcome, String> {
        let label = unit_label(linked);

        if linked.link.remote_item_id.trim().is_empty() {
            return Err(format!("{}: listing link has no remote item id", label));
        }

        let item = remote_items
            .get(linked.link.remote_item_id.trim())
            .ok_or_else(|| {
                format!(
                    "{}: remote item {} could not be fetched",
                    label, linked.link.remote_item_id
                )
            })?;

        let Resolution {
            coordinate,
            discovered_variation_id,
        } = identity::resolve(&linked.link, item, &linked.variant)
            .map_err(|e| format!("{}: {}", label, e))?;

        if let Some(variation_id) = discovered_variation_id {
            // Persist the recovered id so future runs resolve directly.
            self.store
                .update_listing_link(
                    linked.link.id,
                    ListingLinkPatch {
                        remote_variation_id: Some(variation_id.clone()),
                        ..Default::default()
                    },
                )
                .await
                .map_err(|e| format!("{}: failed to persist recovered variation id: {}", label, e))?;

            if let Err(e) = self
                .event_sender
                .send(Event::ListingLinkRecovered {
                    link_id: linked.link.id,
                    variant_id: linked.variant.id,
                    remote_item_id: linked.link.remote_item_id.clone(),
                    remote_variation_id: variation_id,
                })
                .await
            {
                warn!(error = %e, "failed to publish link recovery event");
            }
        }

        self.engine
            .reconcile(direction, linked, &coordinate)
            .await
            .map_err(|e| format!("{}: {}", label, e))
    }
}

fn unit_label(linked: &LinkedUnit) -> String {
    match linked.variant.sku.as_deref() {
        Some(sku) if !sku.is_empty() => format!("variant {} ({})", linked.variant.id, sku),
        _ => format!("variant {}", linked.variant.id),
    }
}
