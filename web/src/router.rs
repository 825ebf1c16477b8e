//! Router configuration.
//!
//! Builds the complete Axum router with all endpoints and middleware.

use crate::handlers::{
    create_product, delete_product, get_product, health_check, list_products, render_metrics,
    update_product,
};
use crate::middleware::{rate_limit_layer, trace_id_layer};
use crate::state::AppState;
use axum::{routing::get, Router};
use product_catalog_runtime::SlidingWindowRateLimiter;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// - `/health` and `/metrics` are never rate limited
/// - `/products` routes share the budget of `limiter`
/// - every route gets a trace id, request tracing and permissive CORS
#[must_use]
pub fn build_router(state: AppState, limiter: Arc<SlidingWindowRateLimiter>) -> Router {
    let product_routes = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .layer(rate_limit_layer(limiter));

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(render_metrics))
        .merge(product_routes)
        .layer(TraceLayer::new_for_http())
        .layer(trace_id_layer())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
