//! Prometheus metrics for observability and monitoring.
//!
//! This module provides metric collection for the engine components:
//! - Product store operations and table size
//! - Rate limiter admissions and denials
//! - Deletion notification delivery
//!
//! # Example
//!
//! ```rust,no_run
//! use product_catalog_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut exporter = MetricsExporter::new();
//! exporter.install()?;
//!
//! // Serve `exporter.render()` from a /metrics endpoint
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use thiserror::Error;

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Prometheus exporter.
///
/// Installs the global recorder and renders the text exposition format for
/// an HTTP endpoint owned by the caller.
#[derive(Default)]
pub struct MetricsExporter {
    handle: Option<PrometheusHandle>,
}

impl MetricsExporter {
    /// Create an exporter that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the global recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the exporter cannot be built.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), this logs a
    /// warning and succeeds without a handle.
    pub fn install(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(BuildError::FailedToSetGlobalRecorder(_)) => {
                tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                Ok(())
            }
            Err(e) => Err(MetricsError::Install(e.to_string())),
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if the exporter hasn't been installed.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    // Store Metrics
    describe_counter!(
        "catalog_products_added_total",
        "Total number of products added"
    );
    describe_counter!(
        "catalog_products_updated_total",
        "Total number of products updated"
    );
    describe_counter!(
        "catalog_products_deleted_total",
        "Total number of products deleted"
    );
    describe_counter!(
        "catalog_products_listed_total",
        "Total number of list queries served"
    );
    describe_histogram!(
        "catalog_list_matches",
        "Number of products matching a list query before pagination"
    );
    describe_gauge!(
        "catalog_products_count",
        "Current number of products in the store"
    );

    // Rate Limiter Metrics
    describe_counter!(
        "catalog_rate_limiter_allowed_total",
        "Total number of admissions granted"
    );
    describe_counter!(
        "catalog_rate_limiter_denied_total",
        "Total number of admissions denied"
    );

    // Notification Metrics
    describe_counter!(
        "catalog_notifications_sent_total",
        "Total number of deletion notifications delivered"
    );
    describe_counter!(
        "catalog_notifications_failed_total",
        "Total number of deletion notifications the sink rejected"
    );
    describe_counter!(
        "catalog_notifications_dropped_total",
        "Total number of deletion notices dropped because the queue was closed"
    );
    describe_gauge!(
        "catalog_notifications_pending",
        "Deletion notices submitted but not yet delivered"
    );
}

/// Product store metrics recorder.
pub struct StoreMetrics;

impl StoreMetrics {
    /// Record a product creation.
    pub fn record_added() {
        counter!("catalog_products_added_total").increment(1);
    }

    /// Record a product update.
    pub fn record_updated() {
        counter!("catalog_products_updated_total").increment(1);
    }

    /// Record a product deletion.
    pub fn record_deleted() {
        counter!("catalog_products_deleted_total").increment(1);
    }

    /// Record a list query and how many products matched it.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_listed(matches: usize) {
        counter!("catalog_products_listed_total").increment(1);
        histogram!("catalog_list_matches").record(matches as f64);
    }

    /// Record the current table size.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_count(count: usize) {
        gauge!("catalog_products_count").set(count as f64);
    }
}

/// Rate limiter metrics recorder.
pub struct RateLimiterMetrics;

impl RateLimiterMetrics {
    /// Record a granted admission.
    pub fn record_allowed() {
        counter!("catalog_rate_limiter_allowed_total").increment(1);
    }

    /// Record a denied admission.
    pub fn record_denied() {
        counter!("catalog_rate_limiter_denied_total").increment(1);
    }
}

/// Notification metrics recorder.
pub struct NotificationMetrics;

impl NotificationMetrics {
    /// Record a delivered notification.
    pub fn record_sent() {
        counter!("catalog_notifications_sent_total").increment(1);
    }

    /// Record a notification the sink rejected.
    pub fn record_failed() {
        counter!("catalog_notifications_failed_total").increment(1);
    }

    /// Record a notice dropped on a closed queue.
    pub fn record_dropped() {
        counter!("catalog_notifications_dropped_total").increment(1);
    }

    /// Record the number of notices still in flight.
    #[allow(clippy::cast_precision_loss)]
    pub fn record_pending(pending: usize) {
        gauge!("catalog_notifications_pending").set(pending as f64);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_creation() {
        let exporter = MetricsExporter::new();
        assert!(exporter.handle().is_none());
        assert!(exporter.render().is_none());
    }

    #[test]
    fn test_exporter_render() {
        let mut exporter = MetricsExporter::new();
        exporter.install().unwrap();

        StoreMetrics::record_added();
        RateLimiterMetrics::record_denied();

        // If another test installed the recorder first, handle is None.
        // Metrics are still being recorded globally.
        if let Some(rendered) = exporter.render() {
            assert!(rendered.contains("catalog_products_added_total"));
            assert!(rendered.contains("catalog_rate_limiter_denied_total"));
        }
    }
}
