use std::sync::Arc;

use serde::Serialize;
use tracing::{instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entities::stock_movement::{self, MovementKind},
    errors::ServiceError,
    events::{Event, EventSender},
    services::catalog::{AppliedMutation, CatalogStore, QuantityWrite, StockMutation},
};

/// Comparison of a variant's stored quantity against its movement log.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LedgerAudit {
    pub variant_id: Uuid,
    pub stored_quantity: i32,
    /// Quantity reconstructed as the sum of all movement deltas.
    pub reconstructed_quantity: i32,
    pub movements: usize,
    pub consistent: bool,
}

/// Append-only record of every local quantity change. Every mutation going
/// through this service pairs the quantity write with exactly one movement
/// entry, committed atomically by the catalog store.
#[derive(Clone)]
pub struct StockLedgerService {
    store: Arc<dyn CatalogStore>,
    event_sender: EventSender,
}

impl StockLedgerService {
    pub fn new(store: Arc<dyn CatalogStore>, event_sender: EventSender) -> Self {
        Self {
            store,
            event_sender,
        }
    }

    /// Record goods received into stock.
    #[instrument(skip(self))]
    pub async fn record_receipt(
        &self,
        variant_id: Uuid,
        quantity: i32,
        reference: Option<String>,
    ) -> Result<AppliedMutation, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "received quantity must be positive".into(),
            ));
        }
        self.apply(
            variant_id,
            QuantityWrite::Delta(quantity),
            MovementKind::Received,
            reference,
        )
        .await
    }

    /// Record a sale-driven decrement.
    #[instrument(skip(self))]
    pub async fn record_sale(
        &self,
        variant_id: Uuid,
        quantity: i32,
        reference: Option<String>,
    ) -> Result<AppliedMutation, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidInput(
                "sold quantity must be positive".into(),
            ));
        }
        self.apply(
            variant_id,
            QuantityWrite::Delta(-quantity),
            MovementKind::Sold,
            reference,
        )
        .await
    }

    /// Record a manual stock adjustment.
    #[instrument(skip(self))]
    pub async fn record_adjustment(
        &self,
        variant_id: Uuid,
        delta: i32,
        reference: Option<String>,
    ) -> Result<AppliedMutation, ServiceError> {
        if delta == 0 {
            return Err(ServiceError::InvalidInput(
                "adjustment delta must be non-zero".into(),
            ));
        }
        self.apply(
            variant_id,
            QuantityWrite::Delta(delta),
            MovementKind::Adjusted,
            reference,
        )
        .await
    }

    /// Record a sync-driven correction: the local quantity is set to the
    /// remote value and the movement carries the signed difference.
    #[instrument(skip(self))]
    pub async fn record_sync_correction(
        &self,
        variant_id: Uuid,
        remote_quantity: i32,
        reference: String,
    ) -> Result<AppliedMutation, ServiceError> {
        self.apply(
            variant_id,
            QuantityWrite::Set(remote_quantity),
            MovementKind::SyncReconciled,
            Some(reference),
        )
        .await
    }

    /// Movement log for a variant, oldest first.
    pub async fn movements(
        &self,
        variant_id: Uuid,
    ) -> Result<Vec<stock_movement::Model>, ServiceError> {
        self.store.movements(variant_id).await
    }

    /// Replay the movement log and compare against the stored quantity.
    /// Variants start at zero stock, so the sum of deltas must equal the
    /// stored value.
    #[instrument(skip(self))]
    pub async fn audit(&self, variant_id: Uuid) -> Result<LedgerAudit, ServiceError> {
        let variant = self.store.inventory_unit(variant_id).await?;
        let movements = self.store.movements(variant_id).await?;
        let reconstructed: i32 = movements.iter().map(|m| m.quantity).sum();
        Ok(LedgerAudit {
            variant_id,
            stored_quantity: variant.stock_quantity,
            reconstructed_quantity: reconstructed,
            movements: movements.len(),
            consistent: reconstructed == variant.stock_quantity,
        })
    }

    async fn apply(
        &self,
        variant_id: Uuid,
        write: QuantityWrite,
        kind: MovementKind,
        reference: Option<String>,
    ) -> Result<AppliedMutation, ServiceError> {
        let applied = self
            .store
            .mutate_stock(
                variant_id,
                StockMutation {
                    write,
                    kind,
                    reference: reference.clone(),
                },
            )
            .await?;

        // Event delivery is best-effort; the mutation is already committed.
        if let Err(e) = self
            .event_sender
            .send(Event::StockAdjusted {
                variant_id,
                previous_quantity: applied.previous_quantity,
                new_quantity: applied.new_quantity,
                movement_kind: kind.as_str().to_string(),
                reference,
            })
            .await
        {
            warn!(%variant_id, error = %e, "failed to publish stock adjustment event");
        }

        Ok(applied)
    }
}
