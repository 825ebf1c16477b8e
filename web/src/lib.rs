//! HTTP API for the product catalog service.
//!
//! A thin Axum shell over the runtime crate: handlers parse and validate
//! requests, call the [`ProductStore`](product_catalog_runtime::ProductStore)
//! and map results to JSON responses.
//!
//! # Request Flow
//!
//! 1. **CORS** and **trace id** layers run for every request
//! 2. **Rate limit** layer admits or rejects `/products` requests (429)
//! 3. **Handler** extracts the trace id, path, query or body
//! 4. **Store** performs the operation under its lock
//! 5. **Result** maps to a status code and JSON body
//!
//! Deleting a product responds immediately; the deletion notice is
//! delivered by the runtime's notification dispatcher in the background.
//!
//! # Example
//!
//! ```ignore
//! use product_catalog_web::{build_router, AppState};
//!
//! let (queue, receiver) = NotificationQueue::channel();
//! let store = Arc::new(ProductStore::new(queue));
//! let limiter = Arc::new(SlidingWindowRateLimiter::new(100));
//!
//! let app = build_router(AppState::new(store), limiter);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use extractors::Trace;
pub use middleware::{rate_limit_layer, trace_id_layer, TRACE_ID_HEADER};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
