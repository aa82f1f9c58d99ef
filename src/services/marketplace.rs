use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::config::MarketplaceConfig;
use crate::errors::ServiceError;

/// A variation of a remote marketplace item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteVariation {
    pub id: String,
    #[serde(default)]
    pub available_quantity: i32,
    /// Seller-supplied custom field, conventionally holding the local SKU.
    #[serde(default, alias = "seller_custom_field")]
    pub seller_sku: Option<String>,
}

/// A remote marketplace listing with its variations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteItem {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub available_quantity: i32,
    #[serde(default)]
    pub variations: Vec<RemoteVariation>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    results: Vec<RemoteItem>,
}

/// Authenticated access to the remote item catalog. Credential refresh is
/// handled outside this crate; the client only carries the current token.
#[async_trait]
pub trait MarketplaceClient: Send + Sync {
    /// Batched item fetch. Items that could not be fetched are absent from
    /// the result; callers treat absence as a per-item failure.
    async fn items(&self, ids: &[String]) -> Result<Vec<RemoteItem>, ServiceError>;

    /// Set the available quantity on an item without variations.
    async fn set_item_quantity(&self, item_id: &str, quantity: i32) -> Result<(), ServiceError>;

    /// Set the available quantity on a single variation.
    async fn set_variation_quantity(
        &self,
        item_id: &str,
        variation_id: &str,
        quantity: i32,
    ) -> Result<(), ServiceError>;
}

/// REST implementation of [`MarketplaceClient`].
pub struct HttpMarketplaceClient {
    client: Client,
    base_url: String,
    multiget_limit: usize,
}

impl HttpMarketplaceClient {
    /// Build a client with bearer credentials from configuration.
    pub fn new(config: &MarketplaceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token))
            .context("marketplace access token contains invalid header characters")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .context("failed to construct reqwest client for marketplace access")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            multiget_limit: config.multiget_limit,
        })
    }

    async fn fetch_chunk(&self, ids: &[String]) -> Result<Vec<RemoteItem>, ServiceError> {
        let url = format!("{}/items", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", ids.join(","))])
            .send()
            .await
            .map_err(|e| ServiceError::ExternalApiError(format!("item fetch failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalApiError(format!(
                "item fetch returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        let items: ItemsResponse = response.json().await.map_err(|e| {
            ServiceError::ExternalApiError(format!("item fetch returned invalid JSON: {}", e))
        })?;
        Ok(items.results)
    }

    async fn put_quantity(&self, path: String, quantity: i32) -> Result<(), ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .put(&url)
            .json(&json!({ "available_quantity": quantity }))
            .send()
            .await
            .map_err(|e| ServiceError::ExternalApiError(format!("quantity update failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::ExternalApiError(format!(
                "quantity update returned {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketplaceClient for HttpMarketplaceClient {
    async fn items(&self, ids: &[String]) -> Result<Vec<RemoteItem>, ServiceError> {
        let mut items = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.multiget_limit.max(1)) {
            match self.fetch_chunk(chunk).await {
                Ok(fetched) => items.extend(fetched),
                // A failed chunk only loses its own items; the per-unit loop
                // reports each one as unavailable.
                Err(e) => warn!(ids = %chunk.join(","), error = %e, "item chunk fetch failed"),
            }
        }
        Ok(items)
    }

    async fn set_item_quantity(&self, item_id: &str, quantity: i32) -> Result<(), ServiceError> {
        self.put_quantity(format!("/items/{}", item_id), quantity)
            .await
    }

    async fn set_variation_quantity(
        &self,
        item_id: &str,
        variation_id: &str,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        self.put_quantity(
            format!("/items/{}/variations/{}", item_id, variation_id),
            quantity,
        )
        .await
    }
}
