//! Console notification sink for development.

use product_catalog_core::notification::{DeletionNotice, NotificationError, NotificationSink};
use std::time::Duration;
use tracing::info;

/// Default simulated delivery latency
pub const DEFAULT_LATENCY: Duration = Duration::from_secs(2);

/// Console notification sink.
///
/// Logs deletion notices instead of delivering them anywhere, after waiting
/// `latency` to mimic an email gateway or message broker round trip.
///
/// # Examples
///
/// ```ignore
/// use product_catalog_runtime::ConsoleNotificationSink;
///
/// let sink = ConsoleNotificationSink::new(Duration::from_millis(500));
/// let dispatcher = NotificationDispatcher::spawn(receiver, Arc::new(sink));
/// ```
#[derive(Clone, Debug)]
pub struct ConsoleNotificationSink {
    latency: Duration,
}

impl ConsoleNotificationSink {
    /// Create a console sink with the given simulated latency.
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Simulated delivery latency.
    #[must_use]
    pub const fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for ConsoleNotificationSink {
    fn default() -> Self {
        Self::new(DEFAULT_LATENCY)
    }
}

impl NotificationSink for ConsoleNotificationSink {
    async fn notify(&self, notice: DeletionNotice) -> Result<(), NotificationError> {
        info!(
            trace_id = %notice.trace_id,
            product_id = %notice.product_id,
            deleted_at = %notice.deleted_at,
            "📧 Sending product deletion notification (Development Mode)"
        );

        tokio::time::sleep(self.latency).await;

        info!(
            trace_id = %notice.trace_id,
            product_id = %notice.product_id,
            "📧 Product deletion notification sent"
        );

        Ok(())
    }
}
