//! # Product Catalog Testing
//!
//! Testing utilities and helpers for the product catalog.
//!
//! This crate provides:
//! - Test doubles for the capability traits (`ManualClock`, notification sinks)
//! - Fixtures for building products and queries
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```ignore
//! use product_catalog_testing::{ManualClock, RecordingNotificationSink};
//!
//! #[tokio::test]
//! async fn test_deletion_notifies() {
//!     let (queue, receiver) = NotificationQueue::channel();
//!     let sink = Arc::new(RecordingNotificationSink::new());
//!     let dispatcher = NotificationDispatcher::spawn(receiver, Arc::clone(&sink));
//!     let store = ProductStore::new(queue);
//!
//!     // ... add and delete a product ...
//!
//!     dispatcher.drain(Duration::from_secs(1)).await.unwrap();
//!     assert_eq!(sink.count(), 1);
//! }
//! ```

use product_catalog_core::environment::Clock;
use product_catalog_core::notification::{DeletionNotice, NotificationError, NotificationSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Mock implementations of capability traits
pub mod mocks {
    use super::{
        Clock, DeletionNotice, Duration, Instant, Mutex, NotificationError, NotificationSink,
        PoisonError, AtomicUsize, Ordering,
    };

    /// Manually advanced clock for deterministic tests
    ///
    /// Time stands still until [`ManualClock::advance`] is called.
    ///
    /// # Example
    ///
    /// ```
    /// use product_catalog_testing::mocks::ManualClock;
    /// use product_catalog_core::environment::Clock;
    /// use std::time::Duration;
    ///
    /// let clock = ManualClock::new();
    /// let start = clock.now();
    /// assert_eq!(clock.now(), start);
    ///
    /// clock.advance(Duration::from_secs(2));
    /// assert_eq!(clock.now() - start, Duration::from_secs(2));
    /// ```
    #[derive(Debug)]
    pub struct ManualClock {
        base: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        /// Create a clock frozen at the current instant
        #[must_use]
        pub fn new() -> Self {
            Self {
                base: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: Duration) {
            let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
            *offset += by;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.base + *self.offset.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }

    /// Notification sink that records every notice it receives
    ///
    /// Optionally waits before recording, to stand in for a slow channel.
    #[derive(Debug, Default)]
    pub struct RecordingNotificationSink {
        latency: Duration,
        notices: Mutex<Vec<DeletionNotice>>,
    }

    impl RecordingNotificationSink {
        /// Create a sink that records immediately
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a sink that sleeps for `latency` before recording
        #[must_use]
        pub fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                notices: Mutex::new(Vec::new()),
            }
        }

        /// Notices received so far, in arrival order
        #[must_use]
        pub fn notices(&self) -> Vec<DeletionNotice> {
            self.notices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        /// Number of notices received so far
        #[must_use]
        pub fn count(&self) -> usize {
            self.notices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
        }
    }

    impl NotificationSink for RecordingNotificationSink {
        async fn notify(&self, notice: DeletionNotice) -> Result<(), NotificationError> {
            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }
            self.notices
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(notice);
            Ok(())
        }
    }

    /// Notification sink that rejects every notice
    ///
    /// By default each notice fails with [`NotificationError::Delivery`];
    /// [`FailingNotificationSink::unavailable`] reports the channel as down instead.
    #[derive(Debug, Default)]
    pub struct FailingNotificationSink {
        attempts: AtomicUsize,
        unavailable: bool,
    }

    impl FailingNotificationSink {
        /// Create a sink that rejects each notice
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a sink whose channel is unreachable
        #[must_use]
        pub fn unavailable() -> Self {
            Self {
                attempts: AtomicUsize::new(0),
                unavailable: true,
            }
        }

        /// Number of delivery attempts seen
        #[must_use]
        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl NotificationSink for FailingNotificationSink {
        async fn notify(&self, notice: DeletionNotice) -> Result<(), NotificationError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(NotificationError::Unavailable);
            }
            Err(NotificationError::Delivery(format!(
                "rejected notice for product {}",
                notice.product_id
            )))
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    use product_catalog_core::product::ProductFields;

    /// Fields for a product with a numbered name.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    pub fn sample_fields(n: usize) -> ProductFields {
        ProductFields::new(format!("Product {n}"), 1.0 + n as f64, 10 + n as i64)
    }

    /// Fields for `count` numbered products.
    #[must_use]
    pub fn sample_catalog(count: usize) -> Vec<ProductFields> {
        (0..count).map(sample_fields).collect()
    }

    /// Install a test-friendly tracing subscriber.
    ///
    /// Safe to call from every test; only the first call installs it.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use product_catalog_core::product::ProductFields;
    use product_catalog_core::query::ExclusiveRange;
    use proptest::prelude::*;

    /// Strategy for product names drawn from a small vocabulary.
    ///
    /// Names repeat often enough for substring filters to hit.
    pub fn product_name() -> impl Strategy<Value = String> {
        (
            prop::sample::select(vec!["Premium", "Basic", "Deluxe", "eco", "PRO"]),
            prop::sample::select(vec!["Coffee", "tea", "Mug", "KETTLE", "filter"]),
        )
            .prop_map(|(adjective, noun)| format!("{adjective} {noun}"))
    }

    /// Strategy for valid product fields.
    pub fn product_fields() -> impl Strategy<Value = ProductFields> {
        (product_name(), 0u32..10_000, 0i64..1_000).prop_map(|(name, cents, quantity)| {
            ProductFields::new(name, f64::from(cents) / 100.0, quantity)
        })
    }

    /// Strategy for a catalog of up to `max` products.
    pub fn catalog(max: usize) -> impl Strategy<Value = Vec<ProductFields>> {
        prop::collection::vec(product_fields(), 0..=max)
    }

    /// Strategy for a quantity range with `low <= high`.
    pub fn quantity_range() -> impl Strategy<Value = ExclusiveRange<i64>> {
        (0i64..1_000, 0i64..1_000)
            .prop_map(|(a, b)| ExclusiveRange::new(a.min(b), a.max(b)))
    }
}

// Re-export commonly used items
pub use helpers::{init_test_tracing, sample_catalog, sample_fields};
pub use mocks::{FailingNotificationSink, ManualClock, RecordingNotificationSink};
