//! HTTP API integration tests
//!
//! Drives the full router (middleware included) against a real in-memory
//! store. CRUD flows go through `axum-test`; header and raw query string
//! cases use `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use axum_test::TestServer;
use product_catalog_core::{Product, TraceId};
use product_catalog_runtime::{
    NotificationQueue, NotificationReceiver, ProductStore, SlidingWindowRateLimiter,
};
use product_catalog_web::handlers::products::{CreateProductResponse, ListProductsResponse};
use product_catalog_web::{build_router, AppState, TRACE_ID_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

// ============================================================================
// Test Fixtures
// ============================================================================

fn app_with_limit(limit: usize) -> (Router, NotificationReceiver) {
    product_catalog_testing::init_test_tracing();
    let (queue, receiver) = NotificationQueue::channel();
    let store = Arc::new(ProductStore::new(queue));
    let limiter = Arc::new(SlidingWindowRateLimiter::with_window(
        limit,
        Duration::from_secs(60),
    ));
    (build_router(AppState::new(store), limiter), receiver)
}

fn app() -> (Router, NotificationReceiver) {
    app_with_limit(10_000)
}

fn server() -> (TestServer, NotificationReceiver) {
    let (router, receiver) = app();
    (TestServer::new(router).unwrap(), receiver)
}

async fn create(server: &TestServer, body: Value) -> i64 {
    let response = server.post("/products").json(&body).await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<CreateProductResponse>().id.get()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (server, _rx) = server();

    let response = server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>(), json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_create_then_get() {
    let (server, _rx) = server();

    let first = create(&server, json!({"name": "Mug", "price": 8.5, "quantity": 12})).await;
    let second = create(&server, json!({"name": "Kettle", "price": 30, "quantity": 2})).await;
    assert_eq!((first, second), (0, 1));

    let response = server.get("/products/1").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let product = response.json::<Product>();
    assert_eq!(product.name, "Kettle");
    assert!((product.price - 30.0).abs() < f64::EPSILON);
    assert_eq!(product.quantity, 2);
}

#[tokio::test]
async fn test_get_missing_and_malformed_ids() {
    let (server, _rx) = server();

    let missing = server.get("/products/99").await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(missing.json::<Value>()["code"], "NOT_FOUND");

    let malformed = server.get("/products/abc").await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_undecodable_path_returns_json_error() {
    let (router, _rx) = app();

    for method in ["GET", "PUT", "DELETE"] {
        let request = Request::builder()
            .method(method)
            .uri("/products/%FF")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"Mug","price":1.0,"quantity":1}"#))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method}");
        let body = body_json(response).await;
        assert_eq!(body["code"], "BAD_REQUEST", "{method}");
        assert!(body["message"].as_str().unwrap().starts_with("Invalid path"));
    }
}

#[tokio::test]
async fn test_create_rejects_invalid_bodies() {
    let (server, _rx) = server();

    let malformed = server.post("/products").json(&json!({"name": "Mug"})).await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(malformed.json::<Value>()["code"], "BAD_REQUEST");

    let invalid = server
        .post("/products")
        .json(&json!({"name": "", "price": 1.0, "quantity": 1}))
        .await;
    assert_eq!(invalid.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let negative = server
        .post("/products")
        .json(&json!({"name": "Mug", "price": -1.0, "quantity": 1}))
        .await;
    assert_eq!(negative.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing was stored, so the next id is still 0.
    let id = create(&server, json!({"name": "Mug", "price": 1.0, "quantity": 1})).await;
    assert_eq!(id, 0);
}

#[tokio::test]
async fn test_update_keeps_id() {
    let (server, _rx) = server();
    let id = create(&server, json!({"name": "Mug", "price": 8.0, "quantity": 12})).await;

    let response = server
        .put(&format!("/products/{id}"))
        .json(&json!({"name": "Travel mug", "price": 11.0, "quantity": 3}))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let product = response.json::<Product>();
    assert_eq!(product.id.get(), id);
    assert_eq!(product.name, "Travel mug");

    let missing = server
        .put("/products/42")
        .json(&json!({"name": "Ghost", "price": 1.0, "quantity": 1}))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_submits_one_notice() {
    let (server, mut rx) = server();
    let id = create(&server, json!({"name": "Mug", "price": 8.0, "quantity": 12})).await;

    let deleted = server.delete(&format!("/products/{id}")).await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let again = server.delete(&format!("/products/{id}")).await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);

    let notice = rx.try_recv().expect("one notice for the successful delete");
    assert_eq!(notice.product_id.get(), id);
    assert!(rx.try_recv().is_none());

    assert_eq!(
        server.get(&format!("/products/{id}")).await.status_code(),
        StatusCode::NOT_FOUND
    );
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn test_list_defaults_and_pagination() {
    let (server, _rx) = server();
    for n in 0..25 {
        create(&server, json!({"name": format!("Item {n}"), "price": 1.0, "quantity": n})).await;
    }

    let first = server.get("/products").await.json::<ListProductsResponse>();
    assert_eq!(first.total, 25);
    assert_eq!((first.page, first.limit), (1, 10));
    assert_eq!(first.results.len(), 10);
    assert_eq!(first.results[0].id.get(), 0);

    let last = server
        .get("/products")
        .add_query_param("page", 3)
        .add_query_param("limit", 10)
        .await
        .json::<ListProductsResponse>();
    let ids: Vec<i64> = last.results.iter().map(|p| p.id.get()).collect();
    assert_eq!(ids, (20..25).collect::<Vec<_>>());

    let beyond = server
        .get("/products")
        .add_query_param("page", 4)
        .await
        .json::<ListProductsResponse>();
    assert!(beyond.results.is_empty());
    assert_eq!(beyond.total, 25);
}

#[tokio::test]
async fn test_list_filters() {
    let (server, _rx) = server();
    create(&server, json!({"name": "Premium Coffee", "price": 5.0, "quantity": 10})).await;
    create(&server, json!({"name": "Basic Tea", "price": 10.0, "quantity": 20})).await;
    create(&server, json!({"name": "premium tea", "price": 15.0, "quantity": 30})).await;

    let by_name = server
        .get("/products")
        .add_query_param("name", "PREMIUM")
        .await
        .json::<ListProductsResponse>();
    let ids: Vec<i64> = by_name.results.iter().map(|p| p.id.get()).collect();
    assert_eq!(ids, vec![0, 2]);

    // Bounds are exclusive.
    let by_price = server
        .get("/products")
        .add_query_param("price_min", 5)
        .add_query_param("price_max", 15)
        .await
        .json::<ListProductsResponse>();
    assert_eq!(by_price.total, 1);
    assert_eq!(by_price.results[0].name, "Basic Tea");

    let open_ended = server
        .get("/products")
        .add_query_param("quantity_min", 15)
        .await
        .json::<ListProductsResponse>();
    assert_eq!(open_ended.total, 2);
}

#[tokio::test]
async fn test_unfiltered_listing_includes_zero_price_and_quantity() {
    let (server, _rx) = server();
    create(&server, json!({"name": "Free sample", "price": 0.0, "quantity": 5})).await;
    create(&server, json!({"name": "Sold out", "price": 9.0, "quantity": 0})).await;

    let all = server.get("/products").await.json::<ListProductsResponse>();
    assert_eq!(all.total, 2);

    // An explicit minimum is still exclusive.
    let priced = server
        .get("/products")
        .add_query_param("price_min", 0)
        .await
        .json::<ListProductsResponse>();
    assert_eq!(priced.total, 1);
    assert_eq!(priced.results[0].name, "Sold out");
}

#[tokio::test]
async fn test_list_by_repeated_ids() {
    let (router, _rx) = app();
    let server = TestServer::new(router.clone()).unwrap();
    for n in 0..5 {
        create(&server, json!({"name": format!("Item {n}"), "price": 1.0, "quantity": 1})).await;
    }

    let request = Request::builder()
        .uri("/products?ids%5B%5D=3&ids%5B%5D=1&ids%5B%5D=99")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["results"][0]["id"], 1);
    assert_eq!(body["results"][1]["id"], 3);
}

#[tokio::test]
async fn test_list_rejects_bad_parameters() {
    let (server, _rx) = server();

    let unparseable = server.get("/products").add_query_param("page", "two").await;
    assert_eq!(unparseable.status_code(), StatusCode::BAD_REQUEST);

    let too_large = server.get("/products").add_query_param("limit", 101).await;
    assert_eq!(too_large.status_code(), StatusCode::UNPROCESSABLE_ENTITY);

    let negative = server.get("/products").add_query_param("price_min", -1).await;
    assert_eq!(negative.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Middleware
// ============================================================================

#[tokio::test]
async fn test_trace_id_flows_into_deletion_notice() {
    let (router, mut rx) = app();
    let server = TestServer::new(router.clone()).unwrap();
    let id = create(&server, json!({"name": "Mug", "price": 1.0, "quantity": 1})).await;

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/products/{id}"))
        .header(TRACE_ID_HEADER, "cleanup-run-7")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(response.headers().get(TRACE_ID_HEADER).unwrap(), "cleanup-run-7");
    assert_eq!(rx.try_recv().unwrap().trace_id, TraceId::new("cleanup-run-7"));
}

#[tokio::test]
async fn test_rate_limit_applies_to_products_only() {
    let (router, _rx) = app_with_limit(2);

    let mut statuses = Vec::new();
    for _ in 0..3 {
        let request = Request::builder().uri("/products").body(Body::empty()).unwrap();
        statuses.push(router.clone().oneshot(request).await.unwrap().status());
    }
    assert_eq!(
        statuses,
        vec![StatusCode::OK, StatusCode::OK, StatusCode::TOO_MANY_REQUESTS]
    );

    let request = Request::builder().uri("/products/0").body(Body::empty()).unwrap();
    let limited = router.clone().oneshot(request).await.unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.headers().contains_key(TRACE_ID_HEADER));
    assert_eq!(body_json(limited).await["code"], "RATE_LIMITED");

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let health = router.oneshot(request).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let (server, _rx) = server();
    let response = server.get("/metrics").await;
    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
}
