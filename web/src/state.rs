//! Application state for Axum handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use product_catalog_runtime::ProductStore;
use std::fmt;
use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Cloning is cheap: the store is shared behind an `Arc`.
///
/// # Examples
///
/// ```ignore
/// async fn handler(
///     State(state): State<AppState>,
///     Trace(trace): Trace,
/// ) -> Result<Json<usize>, AppError> {
///     Ok(Json(state.store.len()?))
/// }
/// ```
#[derive(Clone)]
pub struct AppState {
    /// The product table
    pub store: Arc<ProductStore>,
    /// Prometheus handle, when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create application state without a metrics endpoint.
    #[must_use]
    pub const fn new(store: Arc<ProductStore>) -> Self {
        Self {
            store,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    #[must_use]
    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

// `PrometheusHandle` has no `Debug` impl.
impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("store", &self.store)
            .field("metrics_enabled", &self.metrics.is_some())
            .finish_non_exhaustive()
    }
}
