use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use retailsync_api::config::MarketplaceConfig;
use retailsync_api::errors::ServiceError;
use retailsync_api::services::marketplace::{HttpMarketplaceClient, MarketplaceClient};

fn config(base_url: String, multiget_limit: usize) -> MarketplaceConfig {
    MarketplaceConfig {
        platform: "marketplace".into(),
        base_url,
        access_token: "token-123".into(),
        multiget_limit,
    }
}

#[tokio::test]
async fn multiget_sends_bearer_token_and_parses_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("ids", "ITEM1,ITEM2"))
        .and(header("authorization", "Bearer token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "id": "ITEM1",
                    "title": "Linen shirt",
                    "available_quantity": 3,
                    "variations": [
                        {"id": "MA-S", "available_quantity": 1, "seller_custom_field": "AULM080CEF-MA-S"},
                        {"id": "MA-M", "available_quantity": 2}
                    ]
                },
                {"id": "ITEM2", "title": "Wool scarf", "available_quantity": 8}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMarketplaceClient::new(&config(server.uri(), 20)).unwrap();
    let items = client
        .items(&["ITEM1".to_string(), "ITEM2".to_string()])
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].variations.len(), 2);
    // The seller_custom_field alias maps onto seller_sku.
    assert_eq!(
        items[0].variations[0].seller_sku.as_deref(),
        Some("AULM080CEF-MA-S")
    );
    assert_eq!(items[0].variations[1].seller_sku, None);
    assert_eq!(items[1].available_quantity, 8);
    assert!(items[1].variations.is_empty());
}

#[tokio::test]
async fn multiget_chunks_requests_to_the_configured_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("ids", "ITEM1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "ITEM1", "available_quantity": 1}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("ids", "ITEM2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "ITEM2", "available_quantity": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMarketplaceClient::new(&config(server.uri(), 1)).unwrap();
    let items = client
        .items(&["ITEM1".to_string(), "ITEM2".to_string()])
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn a_failing_chunk_only_loses_its_own_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("ids", "ITEM1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("ids", "ITEM2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "ITEM2", "available_quantity": 2}]
        })))
        .mount(&server)
        .await;

    let client = HttpMarketplaceClient::new(&config(server.uri(), 1)).unwrap();
    let items = client
        .items(&["ITEM1".to_string(), "ITEM2".to_string()])
        .await
        .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "ITEM2");
}

#[tokio::test]
async fn set_item_quantity_puts_the_payload() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/ITEM1"))
        .and(body_json(json!({"available_quantity": 10})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMarketplaceClient::new(&config(server.uri(), 20)).unwrap();
    client.set_item_quantity("ITEM1", 10).await.unwrap();
}

#[tokio::test]
async fn set_variation_quantity_targets_the_variation_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/ITEM1/variations/MA-S"))
        .and(body_json(json!({"available_quantity": 4})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpMarketplaceClient::new(&config(server.uri(), 20)).unwrap();
    client
        .set_variation_quantity("ITEM1", "MA-S", 4)
        .await
        .unwrap();
}

#[tokio::test]
async fn quantity_update_errors_surface_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/ITEM1"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let client = HttpMarketplaceClient::new(&config(server.uri(), 20)).unwrap();
    let err = client.set_item_quantity("ITEM1", 10).await.unwrap_err();

    match err {
        ServiceError::ExternalApiError(message) => {
            assert!(message.contains("429"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
