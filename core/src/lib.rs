//! # Product Catalog Core
//!
//! Core types and capability traits for the product catalog service.
//!
//! This crate holds plain data and the seams where the engine meets its
//! environment. It performs no I/O and owns no locks.
//!
//! ## Core Concepts
//!
//! - **Product**: one stored record (`id`, `name`, `price`, `quantity`)
//! - **`ListQuery`**: multi-predicate filter plus pagination for listing
//! - **`TraceId`**: opaque correlation token threaded through every operation
//! - **`NotificationSink`**: asynchronous consumer of deletion notices
//! - **Clock**: monotonic time source, injected so admission control is testable
//!
//! ## Example
//!
//! ```
//! use product_catalog_core::product::ProductFields;
//! use product_catalog_core::query::{ExclusiveRange, ListQuery};
//!
//! let fields = ProductFields::new("Espresso beans", 12.5, 40);
//! assert_eq!(fields.name, "Espresso beans");
//!
//! let query = ListQuery::new(1, 10)
//!     .with_name("beans")
//!     .with_price(ExclusiveRange::new(5.0, 15.0));
//! assert!(query.matches_price(12.5));
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

pub mod notification;
pub mod product;
pub mod query;
pub mod trace;

pub use notification::{DeletionNotice, NotificationError, NotificationSink};
pub use product::{Product, ProductFields, ProductId};
pub use query::{ExclusiveRange, ListQuery, ProductPage};
pub use trace::TraceId;

/// Environment module - Dependency injection traits
///
/// External capabilities the engine relies on are abstracted behind traits
/// and injected at construction time.
pub mod environment {
    use std::time::Instant;

    /// Clock trait - abstracts monotonic time for testability
    ///
    /// # Examples
    ///
    /// ```ignore
    /// // Production - uses the OS monotonic clock
    /// struct SystemClock;
    /// impl Clock for SystemClock {
    ///     fn now(&self) -> Instant {
    ///         Instant::now()
    ///     }
    /// }
    ///
    /// // Test - manually advanced time for deterministic tests
    /// struct ManualClock { base: Instant, offset: Mutex<Duration> }
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current instant
        fn now(&self) -> Instant;
    }

    /// Production clock backed by [`Instant::now`].
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> Instant {
            Instant::now()
        }
    }

    impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
        fn now(&self) -> Instant {
            (**self).now()
        }
    }
}
