use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{
    errors::ServiceError,
    services::{
        catalog::{CatalogStore, LinkedUnit, ListingLinkPatch},
        identity::ResolvedCoordinate,
        ledger::StockLedgerService,
        marketplace::MarketplaceClient,
    },
};

/// Which side of a sync is authoritative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Local stock is written to the marketplace.
    Push,
    /// Marketplace stock is written to the local store.
    Pull,
}

impl SyncDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncDirection::Push => "push",
            SyncDirection::Pull => "pull",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "push" => Some(SyncDirection::Push),
            "pull" => Some(SyncDirection::Pull),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// A quantity was written and the link bookkeeping updated.
    Applied,
    /// Quantities already agree; nothing was written anywhere.
    NoOp,
}

/// Applies a one-directional quantity reconciliation for a single resolved
/// unit. Comparison is exact integer equality.
#[derive(Clone)]
pub struct ReconciliationEngine {
    store: Arc<dyn CatalogStore>,
    marketplace: Arc<dyn MarketplaceClient>,
    ledger: StockLedgerService,
}

impl ReconciliationEngine {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        marketplace: Arc<dyn MarketplaceClient>,
        ledger: StockLedgerService,
    ) -> Self {
        Self {
            store,
            marketplace,
            ledger,
        }
    }

    #[instrument(skip(self, linked, coordinate), fields(variant_id = %linked.variant.id))]
    pub async fn reconcile(
        &self,
        direction: SyncDirection,
        linked: &LinkedUnit,
        coordinate: &ResolvedCoordinate,
    ) -> Result<ReconcileOutcome, ServiceError> {
        match direction {
            SyncDirection::Push => self.push(linked, coordinate).await,
            SyncDirection::Pull => self.pull(linked, coordinate).await,
        }
    }

    /// Local is authoritative: write the local quantity to the remote
    /// coordinate when it differs from the last synced value. No local
    /// mutation, no ledger entry.
    async fn push(
        &self,
        linked: &LinkedUnit,
        coordinate: &ResolvedCoordinate,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let local = linked.variant.stock_quantity;
        if linked.link.stock_synced == Some(local) {
            debug!("push: local quantity already synced");
            return Ok(ReconcileOutcome::NoOp);
        }

        // Quantities crossing the marketplace boundary are non-negative.
        let wire_quantity = local.max(0);
        match coordinate {
            ResolvedCoordinate::Item { item_id, .. } => {
                self.marketplace
                    .set_item_quantity(item_id, wire_quantity)
                    .await?;
            }
            ResolvedCoordinate::Variation {
                item_id,
                variation_id,
                ..
            } => {
                self.marketplace
                    .set_variation_quantity(item_id, variation_id, wire_quantity)
                    .await?;
            }
        }

        // A failure past this point leaves the old stock_synced value, so the
        // next run detects the mismatch again and retries.
        self.store
            .update_listing_link(
                linked.link.id,
                ListingLinkPatch {
                    stock_synced: Some(local),
                    last_sync_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        Ok(ReconcileOutcome::Applied)
    }

    /// Remote is authoritative: set the local quantity to the remote value
    /// through the ledger (quantity write + movement in one transaction).
    async fn pull(
        &self,
        linked: &LinkedUnit,
        coordinate: &ResolvedCoordinate,
    ) -> Result<ReconcileOutcome, ServiceError> {
        let local = linked.variant.stock_quantity;
        let remote = coordinate.available_quantity();
        if remote == local {
            debug!("pull: quantities already agree");
            return Ok(ReconcileOutcome::NoOp);
        }

        let reference = format!(
            "manual marketplace sync ({} item {})",
            linked.link.platform, linked.link.remote_item_id
        );
        self.ledger
            .record_sync_correction(linked.variant.id, remote, reference)
            .await?;

        self.store
            .update_listing_link(
                linked.link.id,
                ListingLinkPatch {
                    stock_synced: Some(remote),
                    last_sync_at: Some(Utc::now()),
                    ..Default::default()
                },
            )
            .await?;
        Ok(ReconcileOutcome::Applied)
    }
}
