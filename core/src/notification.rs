//! Notification sink trait for deletion events.
//!
//! The store hands every successful deletion to a sink without waiting for
//! it. Delivery is best effort: the sink's latency or failure never reaches
//! the caller that deleted the record.

use crate::product::ProductId;
use crate::trace::TraceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// "Product X was deleted" event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionNotice {
    /// The deleted product
    pub product_id: ProductId,
    /// Trace token of the request that deleted it
    pub trace_id: TraceId,
    /// Wall-clock time of the deletion
    pub deleted_at: DateTime<Utc>,
}

impl DeletionNotice {
    /// Creates a notice stamped with the given time
    #[must_use]
    pub const fn new(product_id: ProductId, trace_id: TraceId, deleted_at: DateTime<Utc>) -> Self {
        Self {
            product_id,
            trace_id,
            deleted_at,
        }
    }
}

/// Errors a sink may report.
///
/// These are logged by the dispatcher and otherwise discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotificationError {
    /// The downstream channel rejected or lost the notice
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    /// The downstream channel is not reachable
    #[error("Notification channel unavailable")]
    Unavailable,
}

/// Consumer of deletion notices.
///
/// This trait abstracts over delivery channels (email, message queue,
/// webhook). Implementations may take arbitrarily long; they run detached
/// from the request that triggered them.
///
/// # Example
///
/// ```
/// use product_catalog_core::notification::{DeletionNotice, NotificationError, NotificationSink};
///
/// struct Discard;
///
/// impl NotificationSink for Discard {
///     async fn notify(&self, _notice: DeletionNotice) -> Result<(), NotificationError> {
///         Ok(())
///     }
/// }
/// ```
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver a deletion notice.
    ///
    /// # Errors
    ///
    /// Returns error if the notice could not be delivered. The caller logs
    /// and discards it; there is no retry.
    fn notify(
        &self,
        notice: DeletionNotice,
    ) -> impl std::future::Future<Output = Result<(), NotificationError>> + Send;
}
