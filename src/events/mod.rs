use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Events emitted by the services layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// A variant's on-hand quantity changed; carries the paired ledger entry data.
    StockAdjusted {
        variant_id: Uuid,
        previous_quantity: i32,
        new_quantity: i32,
        movement_kind: String,
        reference: Option<String>,
    },
    /// A listing link's missing remote variation id was recovered from the
    /// local SKU and persisted.
    ListingLinkRecovered {
        link_id: Uuid,
        variant_id: Uuid,
        remote_item_id: String,
        remote_variation_id: String,
    },
    /// A full marketplace sync pass finished.
    SyncCompleted {
        platform: String,
        direction: String,
        synced: usize,
        total: usize,
        failed: usize,
        finished_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events from the channel and logs them. Runs until every sender
/// is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StockAdjusted {
                variant_id,
                previous_quantity,
                new_quantity,
                ref movement_kind,
                ref reference,
            } => {
                info!(
                    %variant_id,
                    previous_quantity,
                    new_quantity,
                    movement_kind = %movement_kind,
                    reference = reference.as_deref().unwrap_or(""),
                    "stock adjusted"
                );
            }
            Event::ListingLinkRecovered {
                link_id,
                variant_id,
                ref remote_item_id,
                ref remote_variation_id,
            } => {
                info!(
                    %link_id,
                    %variant_id,
                    remote_item_id = %remote_item_id,
                    remote_variation_id = %remote_variation_id,
                    "listing link variation recovered"
                );
            }
            Event::SyncCompleted {
                ref platform,
                ref direction,
                synced,
                total,
                failed,
                ..
            } => {
                if failed > 0 {
                    warn!(
                        platform = %platform,
                        direction = %direction,
                        synced,
                        total,
                        failed,
                        "sync completed with errors"
                    );
                } else {
                    info!(platform = %platform, direction = %direction, synced, total, "sync completed");
                }
            }
        }
    }

    info!("Event processing loop stopped");
}
