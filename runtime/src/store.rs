//! Concurrent in-memory product store.
//!
//! One lock covers the whole table and the id counter. Mutations (`add`,
//! `update`, `delete`) hold it exclusively; lookups and listings hold it
//! shared. Every product handed out is an owned clone, so callers can never
//! change stored state except through these operations.
//!
//! Each operation takes a [`TraceId`]. It only appears in log events and in
//! the deletion notice; it never changes behavior.

use crate::error::StoreError;
use crate::metrics::StoreMetrics;
use crate::notifier::NotificationQueue;
use chrono::Utc;
use product_catalog_core::notification::DeletionNotice;
use product_catalog_core::product::{Product, ProductFields, ProductId};
use product_catalog_core::query::{ListQuery, ProductPage};
use product_catalog_core::trace::TraceId;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// The locked state: products by id plus the next id to assign.
#[derive(Debug, Default)]
struct ProductTable {
    products: HashMap<ProductId, Product>,
    next_id: i64,
}

/// In-memory product table shared by all request handlers.
///
/// Construct one per process and share it through an `Arc`.
///
/// # Example
///
/// ```
/// use product_catalog_core::{ProductFields, TraceId};
/// use product_catalog_runtime::{NotificationQueue, ProductStore};
///
/// # fn main() -> Result<(), product_catalog_runtime::StoreError> {
/// let (queue, mut receiver) = NotificationQueue::channel();
/// let store = ProductStore::new(queue);
/// let trace = TraceId::generate();
///
/// let id = store.add_product(&trace, ProductFields::new("Mug", 8.0, 12))?;
/// assert_eq!(id.get(), 0);
///
/// assert!(store.delete_product(&trace, id)?);
/// assert!(receiver.try_recv().is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ProductStore {
    table: RwLock<ProductTable>,
    notifications: NotificationQueue,
}

impl ProductStore {
    /// Create an empty store submitting deletion notices to `notifications`.
    #[must_use]
    pub fn new(notifications: NotificationQueue) -> Self {
        Self {
            table: RwLock::new(ProductTable::default()),
            notifications,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ProductTable>, StoreError> {
        self.table.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ProductTable>, StoreError> {
        self.table.write().map_err(|_| StoreError::LockPoisoned)
    }

    /// Store a new product under the next id.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The id counter is exhausted → `StoreError::IdSpaceExhausted`
    /// - The table lock is poisoned → `StoreError::LockPoisoned`
    pub fn add_product(
        &self,
        trace: &TraceId,
        fields: ProductFields,
    ) -> Result<ProductId, StoreError> {
        let mut table = self.write()?;

        let id = ProductId::new(table.next_id);
        table.next_id = table
            .next_id
            .checked_add(1)
            .ok_or(StoreError::IdSpaceExhausted)?;
        table.products.insert(id, Product::from_fields(id, fields));

        StoreMetrics::record_added();
        StoreMetrics::record_count(table.products.len());
        info!(trace_id = %trace, product_id = %id, "Product added");

        Ok(id)
    }

    /// Look up a product.
    ///
    /// Returns `Ok(None)` when no product has this id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockPoisoned` if the table lock is poisoned.
    pub fn get_product(
        &self,
        trace: &TraceId,
        id: ProductId,
    ) -> Result<Option<Product>, StoreError> {
        let table = self.read()?;

        let product = table.products.get(&id).cloned();
        if product.is_some() {
            debug!(trace_id = %trace, product_id = %id, "Product retrieved");
        } else {
            debug!(trace_id = %trace, product_id = %id, "Product not found");
        }

        Ok(product)
    }

    /// Overwrite a product's name, price and quantity.
    ///
    /// Returns the updated product, or `Ok(None)` when no product has this
    /// id. A missing product is never created.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockPoisoned` if the table lock is poisoned.
    pub fn update_product(
        &self,
        trace: &TraceId,
        id: ProductId,
        fields: ProductFields,
    ) -> Result<Option<Product>, StoreError> {
        let mut table = self.write()?;

        let Some(product) = table.products.get_mut(&id) else {
            debug!(trace_id = %trace, product_id = %id, "Product not found for update");
            return Ok(None);
        };
        product.apply(fields);

        StoreMetrics::record_updated();
        info!(trace_id = %trace, product_id = %id, "Product updated");

        Ok(Some(product.clone()))
    }

    /// Remove a product and queue a deletion notice.
    ///
    /// Returns `Ok(false)` when no product has this id; no notice is queued
    /// in that case. The notice is delivered in the background: this call
    /// returns without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockPoisoned` if the table lock is poisoned.
    pub fn delete_product(&self, trace: &TraceId, id: ProductId) -> Result<bool, StoreError> {
        {
            let mut table = self.write()?;
            if table.products.remove(&id).is_none() {
                debug!(trace_id = %trace, product_id = %id, "Product not found for deletion");
                return Ok(false);
            }
            StoreMetrics::record_count(table.products.len());
        }

        StoreMetrics::record_deleted();
        info!(trace_id = %trace, product_id = %id, "Product deleted");

        self.notifications
            .submit(DeletionNotice::new(id, trace.clone(), Utc::now()));

        Ok(true)
    }

    /// List products matching `query`, ordered by id and paginated.
    ///
    /// `total` in the result counts every match, not just the returned page.
    /// A page past the last match is empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockPoisoned` if the table lock is poisoned.
    pub fn list_products(
        &self,
        trace: &TraceId,
        query: &ListQuery,
    ) -> Result<ProductPage, StoreError> {
        let table = self.read()?;

        let predicate = query.predicate();
        let mut matches: Vec<&Product> = table
            .products
            .values()
            .filter(|product| predicate.matches(product))
            .collect();
        matches.sort_unstable_by_key(|product| product.id);

        let total = matches.len();
        let page = query.page_bounds(total).map_or_else(
            || ProductPage::empty(total),
            |range| ProductPage {
                items: matches[range].iter().map(|&product| product.clone()).collect(),
                total,
            },
        );

        StoreMetrics::record_listed(total);
        info!(
            trace_id = %trace,
            page = query.page,
            page_size = query.page_size,
            total = total,
            returned = page.items.len(),
            "Products listed"
        );

        Ok(page)
    }

    /// Number of stored products.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockPoisoned` if the table lock is poisoned.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.products.len())
    }

    /// Returns true when the store holds no products.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::LockPoisoned` if the table lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.read()?.products.is_empty())
    }
}
