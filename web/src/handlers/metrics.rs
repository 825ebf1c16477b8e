//! Prometheus scrape endpoint.

use crate::error::AppError;
use crate::state::AppState;
use crate::WebResult;
use axum::extract::State;

/// Render all recorded metrics in the Prometheus text format.
///
/// # Endpoint
///
/// ```text
/// GET /metrics
/// ```
///
/// # Errors
///
/// 503 when the service runs without a metrics recorder.
#[allow(clippy::unused_async)]
pub async fn render_metrics(State(state): State<AppState>) -> WebResult<String> {
    state
        .metrics
        .as_ref()
        .map(metrics_exporter_prometheus::PrometheusHandle::render)
        .ok_or_else(|| AppError::unavailable("Metrics are disabled"))
}
