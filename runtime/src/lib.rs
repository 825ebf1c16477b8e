//! # Product Catalog Runtime
//!
//! The engine of the product catalog service.
//!
//! ## Core Components
//!
//! - **`ProductStore`**: in-memory product table with id assignment, mutation,
//!   filtering and pagination, safe under concurrent access
//! - **`SlidingWindowRateLimiter`**: admission gate allowing at most `limit`
//!   events per rolling window
//! - **Notifications**: a non-blocking queue the store submits deletion
//!   notices to, and a dispatcher that delivers them to a `NotificationSink`
//!   in detached tasks
//!
//! ## Example
//!
//! ```ignore
//! use product_catalog_runtime::{ConsoleNotificationSink, NotificationDispatcher, NotificationQueue, ProductStore};
//!
//! let (queue, receiver) = NotificationQueue::channel();
//! let dispatcher = NotificationDispatcher::spawn(receiver, Arc::new(ConsoleNotificationSink::default()));
//! let store = ProductStore::new(queue);
//!
//! let trace = TraceId::generate();
//! let id = store.add_product(&trace, ProductFields::new("Mug", 8.0, 12))?;
//! store.delete_product(&trace, id)?; // returns before the notice is delivered
//! ```

/// Console notification sink simulating a slow downstream channel
pub mod console_sink;

/// Prometheus metrics for observability
pub mod metrics;

/// Deletion notice queue and dispatcher
pub mod notifier;

/// Sliding-window admission control
pub mod rate_limiter;

/// Concurrent in-memory product store
pub mod store;

/// Error types for the runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during store operations
    ///
    /// A missing product is not an error: lookups report it through
    /// `Option`/`bool` results. These variants cover the store itself failing.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// The id counter reached its maximum and cannot assign another id
        ///
        /// Ids are never wrapped or reused.
        #[error("Product id space exhausted")]
        IdSpaceExhausted,

        /// A thread panicked while holding the product table lock
        #[error("Product table lock poisoned")]
        LockPoisoned,
    }
}

pub use console_sink::ConsoleNotificationSink;
pub use error::StoreError;
pub use notifier::{NotificationDispatcher, NotificationQueue, NotificationReceiver};
pub use rate_limiter::{with_rate_limit, RateLimitExceeded, SlidingWindowRateLimiter};
pub use store::ProductStore;
