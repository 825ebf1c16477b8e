//! Health check endpoint.
//!
//! Used by load balancers and monitoring systems to verify the service is
//! running. It is not rate limited.

use axum::Json;
use serde::{Deserialize, Serialize};

/// Health check response body.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    /// Always `"healthy"` while the process serves requests
    pub status: String,
}

/// Liveness check.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy"
/// }
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}
