//! Deletion notice queue and dispatcher.
//!
//! The store never calls a [`NotificationSink`] itself. It submits notices to
//! a [`NotificationQueue`], which only enqueues and returns. A
//! [`NotificationDispatcher`] drains the queue in the background and starts
//! one detached task per notice, so a slow delivery never delays another
//! one, and none of them delay the request that deleted the product.
//!
//! # Flow
//!
//! ```text
//! ProductStore::delete_product ──submit──▶ queue ──▶ dispatcher ──spawn──▶ sink.notify()
//!        (returns immediately)                                    (one task per notice)
//! ```
//!
//! Delivery is best effort: no retry, no acknowledgment back to the store,
//! and notices still in flight when the process exits are lost.

use crate::metrics::NotificationMetrics;
use product_catalog_core::notification::{DeletionNotice, NotificationSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Polling interval used while draining in-flight notices
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Submission side of the deletion notice queue.
///
/// Cloning is cheap; all clones feed the same receiver.
#[derive(Clone, Debug)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<DeletionNotice>,
    pending: Arc<AtomicUsize>,
}

/// Receiving side of the deletion notice queue.
///
/// Hand it to [`NotificationDispatcher::spawn`], or read it directly in
/// tests to assert what the store submitted.
#[derive(Debug)]
pub struct NotificationReceiver {
    receiver: mpsc::UnboundedReceiver<DeletionNotice>,
    pending: Arc<AtomicUsize>,
}

impl NotificationQueue {
    /// Create a connected queue and receiver pair.
    #[must_use]
    pub fn channel() -> (Self, NotificationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));

        (
            Self {
                sender,
                pending: Arc::clone(&pending),
            },
            NotificationReceiver { receiver, pending },
        )
    }

    /// Create a queue whose notices are discarded.
    ///
    /// Useful for stores that have no notification consumer, such as
    /// benchmarks.
    #[must_use]
    pub fn disconnected() -> Self {
        let (queue, _receiver) = Self::channel();
        queue
    }

    /// Enqueue a notice without waiting for delivery.
    ///
    /// Never blocks. If the receiver is gone the notice is logged and
    /// dropped.
    pub fn submit(&self, notice: DeletionNotice) {
        let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;

        match self.sender.send(notice) {
            Ok(()) => NotificationMetrics::record_pending(pending),
            Err(mpsc::error::SendError(notice)) => {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                NotificationMetrics::record_dropped();
                warn!(
                    trace_id = %notice.trace_id,
                    product_id = %notice.product_id,
                    "Notification queue closed, dropping deletion notice"
                );
            }
        }
    }

    /// Number of notices submitted and not yet finished.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl NotificationReceiver {
    /// Wait for the next notice.
    ///
    /// Returns `None` once every [`NotificationQueue`] clone has been dropped
    /// and the queue is empty.
    pub async fn recv(&mut self) -> Option<DeletionNotice> {
        self.recv_tracked().await.map(|(notice, _guard)| notice)
    }

    /// Take the next notice if one is already queued.
    pub fn try_recv(&mut self) -> Option<DeletionNotice> {
        self.receiver.try_recv().ok().map(|notice| {
            drop(PendingGuard(Arc::clone(&self.pending)));
            notice
        })
    }

    /// Receive a notice together with the guard keeping it counted as pending.
    async fn recv_tracked(&mut self) -> Option<(DeletionNotice, PendingGuard)> {
        let notice = self.receiver.recv().await?;
        Some((notice, PendingGuard(Arc::clone(&self.pending))))
    }
}

/// Decrements the pending counter when dropped, including on panic.
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        let previous = self.0.fetch_sub(1, Ordering::SeqCst);
        NotificationMetrics::record_pending(previous.saturating_sub(1));
    }
}

/// Background task delivering queued notices to a sink.
#[derive(Debug)]
pub struct NotificationDispatcher {
    pending: Arc<AtomicUsize>,
    worker: JoinHandle<()>,
}

impl NotificationDispatcher {
    /// Start draining `receiver` into `sink`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn<S: NotificationSink>(mut receiver: NotificationReceiver, sink: Arc<S>) -> Self {
        let pending = Arc::clone(&receiver.pending);

        let worker = tokio::spawn(async move {
            while let Some((notice, guard)) = receiver.recv_tracked().await {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    let _guard = guard;
                    deliver(sink.as_ref(), notice).await;
                });
            }
            debug!("Notification queue closed, dispatcher stopping");
        });

        Self { pending, worker }
    }

    /// Number of notices queued or being delivered.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait for in-flight notices to finish, up to `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the number of notices still in flight if the timeout elapsed
    /// first. Those notices keep running detached.
    pub async fn drain(&self, timeout: Duration) -> Result<(), usize> {
        let wait = async {
            while self.pending() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        };

        if tokio::time::timeout(timeout, wait).await.is_ok() {
            debug!("All deletion notices delivered");
            Ok(())
        } else {
            let remaining = self.pending();
            warn!(
                remaining = remaining,
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                "Timed out draining deletion notices"
            );
            Err(remaining)
        }
    }

    /// Returns true once the queue has closed and the worker stopped.
    ///
    /// Delivery tasks it already started may still be running.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }
}

/// Deliver one notice, logging and swallowing failures.
async fn deliver<S: NotificationSink>(sink: &S, notice: DeletionNotice) {
    let trace_id = notice.trace_id.clone();
    let product_id = notice.product_id;

    match sink.notify(notice).await {
        Ok(()) => {
            NotificationMetrics::record_sent();
            debug!(
                trace_id = %trace_id,
                product_id = %product_id,
                "Deletion notice delivered"
            );
        }
        Err(error) => {
            NotificationMetrics::record_failed();
            warn!(
                trace_id = %trace_id,
                product_id = %product_id,
                error = %error,
                "Deletion notice delivery failed"
            );
        }
    }
}
