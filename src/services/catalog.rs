use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::{
    entities::{
        listing_link::{self, Entity as ListingLinkEntity},
        product_variant::{self, Entity as ProductVariantEntity},
        stock_movement::{self, Entity as StockMovementEntity, MovementKind},
    },
    errors::ServiceError,
};

/// A listing link joined with its product variant.
#[derive(Debug, Clone)]
pub struct LinkedUnit {
    pub link: listing_link::Model,
    pub variant: product_variant::Model,
}

/// How a stock mutation computes the new quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityWrite {
    /// Overwrite the quantity with an absolute value.
    Set(i32),
    /// Apply a signed delta to the current quantity.
    Delta(i32),
}

/// A local quantity change plus the ledger entry that must accompany it.
#[derive(Debug, Clone)]
pub struct StockMutation {
    pub write: QuantityWrite,
    pub kind: MovementKind,
    pub reference: Option<String>,
}

/// Result of an applied stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMutation {
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub delta: i32,
}

/// Partial update of a listing link's sync bookkeeping. Fields left `None`
/// are not touched.
#[derive(Debug, Clone, Default)]
pub struct ListingLinkPatch {
    pub remote_variation_id: Option<String>,
    pub stock_synced: Option<i32>,
    pub last_sync_at: Option<DateTime<Utc>>,
}

/// Read/write access to products, variants, listing links, and the stock
/// movement ledger. The production implementation is backed by Sea-ORM;
/// tests substitute an in-memory fake.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All listing links for a platform, each joined with its variant.
    async fn listing_links(&self, platform: &str) -> Result<Vec<LinkedUnit>, ServiceError>;

    /// Fetch a single variant.
    async fn inventory_unit(&self, variant_id: Uuid) -> Result<product_variant::Model, ServiceError>;

    /// Apply a quantity change and append its stock movement in one
    /// transaction. Either both are committed or neither is visible.
    async fn mutate_stock(
        &self,
        variant_id: Uuid,
        mutation: StockMutation,
    ) -> Result<AppliedMutation, ServiceError>;

    /// Patch a listing link's remote coordinate and sync bookkeeping.
    async fn update_listing_link(
        &self,
        link_id: Uuid,
        patch: ListingLinkPatch,
    ) -> Result<(), ServiceError>;

    /// Movement log for a variant, ordered by creation time.
    async fn movements(&self, variant_id: Uuid) -> Result<Vec<stock_movement::Model>, ServiceError>;
}

/// Sea-ORM backed catalog store.
#[derive(Clone)]
pub struct SqlCatalogStore {
    db: Arc<DatabaseConnection>,
}

impl SqlCatalogStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn listing_links(&self, platform: &str) -> Result<Vec<LinkedUnit>, ServiceError> {
        let rows = ListingLinkEntity::find()
            .filter(listing_link::Column::Platform.eq(platform))
            .find_also_related(ProductVariantEntity)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;

        let mut linked = Vec::with_capacity(rows.len());
        for (link, variant) in rows {
            match variant {
                Some(variant) => linked.push(LinkedUnit { link, variant }),
                None => {
                    // The store enforces referential integrity, so this only
                    // happens on a corrupted database.
                    warn!(link_id = %link.id, "listing link references a missing variant, skipping");
                }
            }
        }
        Ok(linked)
    }

    async fn inventory_unit(&self, variant_id: Uuid) -> Result<product_variant::Model, ServiceError> {
        ProductVariantEntity::find_by_id(variant_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("variant {} not found", variant_id)))
    }

    async fn mutate_stock(
        &self,
        variant_id: Uuid,
        mutation: StockMutation,
    ) -> Result<AppliedMutation, ServiceError> {
        self.db
            .transaction::<_, AppliedMutation, ServiceError>(move |txn| {
                Box::pin(async move {
                    let variant = ProductVariantEntity::find_by_id(variant_id)
                        .one(txn)
                        .await
                        .map_err(ServiceError::db_error)?
                        .ok_or_else(|| {
                            ServiceError::NotFound(format!("variant {} not found", variant_id))
                        })?;

                    let previous = variant.stock_quantity;
                    let new_quantity = match mutation.write {
                        QuantityWrite::Set(quantity) => quantity,
                        QuantityWrite::Delta(delta) => previous + delta,
                    };
                    let delta = new_quantity - previous;

                    let mut active: product_variant::ActiveModel = variant.into();
                    active.stock_quantity = Set(new_quantity);
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(txn).await.map_err(ServiceError::db_error)?;

                    let movement = stock_movement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        variant_id: Set(variant_id),
                        quantity: Set(delta),
                        movement_type: Set(mutation.kind.as_str().to_string()),
                        reference: Set(mutation.reference.clone()),
                        created_at: Set(Utc::now()),
                    };
                    movement.insert(txn).await.map_err(ServiceError::db_error)?;

                    Ok(AppliedMutation {
                        previous_quantity: previous,
                        new_quantity,
                        delta,
                    })
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::db_error(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })
    }

    async fn update_listing_link(
        &self,
        link_id: Uuid,
        patch: ListingLinkPatch,
    ) -> Result<(), ServiceError> {
        let link = ListingLinkEntity::find_by_id(link_id)
            .one(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("listing link {} not found", link_id)))?;

        let mut active: listing_link::ActiveModel = link.into();
        if let Some(variation_id) = patch.remote_variation_id {
            active.remote_variation_id = Set(Some(variation_id));
        }
        if let Some(stock_synced) = patch.stock_synced {
            active.stock_synced = Set(Some(stock_synced));
        }
        if let Some(last_sync_at) = patch.last_sync_at {
            active.last_sync_at = Set(Some(last_sync_at));
        }
        active.updated_at = Set(Some(Utc::now()));
        active
            .update(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    async fn movements(&self, variant_id: Uuid) -> Result<Vec<stock_movement::Model>, ServiceError> {
        StockMovementEntity::find()
            .filter(stock_movement::Column::VariantId.eq(variant_id))
            .order_by_asc(stock_movement::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }
}
