//! Listing queries: filtering predicates and pagination.
//!
//! Every constraint in a [`ListQuery`] is optional. A record matches when it
//! satisfies all of the constraints that are present:
//!
//! - `ids`: the record's id is a member (ignored when empty)
//! - `name`: the record's name contains the pattern, case-insensitively
//! - `price` / `quantity`: the value lies strictly inside the range
//!
//! Matches are ordered by id and then sliced into pages of `page_size`,
//! with pages numbered from 1.

use crate::product::{Product, ProductId};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An open interval `(low, high)`: both bounds are excluded.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExclusiveRange<T> {
    /// Lower bound (excluded)
    pub low: T,
    /// Upper bound (excluded)
    pub high: T,
}

impl<T: PartialOrd + Copy + Default> ExclusiveRange<T> {
    /// Creates a new open interval
    #[must_use]
    pub const fn new(low: T, high: T) -> Self {
        Self { low, high }
    }

    /// Decodes the `[low, high]` pair encoding used by older callers.
    ///
    /// `[0, 0]` means "no constraint" and yields `None`. A record whose value
    /// is genuinely zero therefore cannot be selected through this encoding.
    #[must_use]
    pub fn from_sentinel(bounds: [T; 2]) -> Option<Self> {
        let zero = T::default();
        if bounds[0] == zero && bounds[1] == zero {
            None
        } else {
            Some(Self::new(bounds[0], bounds[1]))
        }
    }

    /// Returns true when `value` lies strictly between the bounds
    pub fn contains(&self, value: T) -> bool {
        self.low < value && value < self.high
    }
}

/// Filter and pagination parameters for listing products.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    /// 1-based page number; 0 is treated as 1
    pub page: usize,
    /// Maximum number of items per page
    pub page_size: usize,
    /// Restrict to these ids (no constraint when empty)
    pub ids: Vec<ProductId>,
    /// Case-insensitive substring the name must contain
    pub name: Option<String>,
    /// Open interval the price must fall into
    pub price: Option<ExclusiveRange<f64>>,
    /// Open interval the quantity must fall into
    pub quantity: Option<ExclusiveRange<i64>>,
}

impl ListQuery {
    /// Creates an unfiltered query for the given page
    #[must_use]
    pub const fn new(page: usize, page_size: usize) -> Self {
        Self {
            page,
            page_size,
            ids: Vec::new(),
            name: None,
            price: None,
            quantity: None,
        }
    }

    /// Restrict results to the given ids
    #[must_use]
    pub fn with_ids(mut self, ids: impl IntoIterator<Item = ProductId>) -> Self {
        self.ids = ids.into_iter().collect();
        self
    }

    /// Restrict results to names containing `pattern`
    #[must_use]
    pub fn with_name(mut self, pattern: impl Into<String>) -> Self {
        self.name = Some(pattern.into());
        self
    }

    /// Restrict results to prices strictly inside `range`
    #[must_use]
    pub const fn with_price(mut self, range: ExclusiveRange<f64>) -> Self {
        self.price = Some(range);
        self
    }

    /// Restrict results to quantities strictly inside `range`
    #[must_use]
    pub const fn with_quantity(mut self, range: ExclusiveRange<i64>) -> Self {
        self.quantity = Some(range);
        self
    }

    /// Returns true when `price` satisfies the price constraint
    #[must_use]
    pub fn matches_price(&self, price: f64) -> bool {
        self.price.is_none_or(|range| range.contains(price))
    }

    /// Returns true when `quantity` satisfies the quantity constraint
    #[must_use]
    pub fn matches_quantity(&self, quantity: i64) -> bool {
        self.quantity.is_none_or(|range| range.contains(quantity))
    }

    /// Compiles the filter part of the query into a reusable predicate.
    #[must_use]
    pub fn predicate(&self) -> Predicate<'_> {
        Predicate {
            query: self,
            name: self
                .name
                .as_deref()
                .filter(|pattern| !pattern.is_empty())
                .map(str::to_lowercase),
        }
    }

    /// Index range of the requested page within `total` sorted matches.
    ///
    /// Returns `None` when the page starts at or beyond the last match.
    #[must_use]
    pub fn page_bounds(&self, total: usize) -> Option<Range<usize>> {
        let start = self.page.max(1).saturating_sub(1).saturating_mul(self.page_size);
        if start >= total {
            return None;
        }
        let end = start.saturating_add(self.page_size).min(total);
        Some(start..end)
    }
}

/// A compiled listing predicate.
///
/// Holds the lowercased name pattern so it is computed once per query rather
/// than once per record.
#[derive(Debug)]
pub struct Predicate<'a> {
    query: &'a ListQuery,
    name: Option<String>,
}

impl Predicate<'_> {
    /// Returns true when `product` satisfies every present constraint
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if !self.query.ids.is_empty() && !self.query.ids.contains(&product.id) {
            return false;
        }

        if let Some(pattern) = &self.name {
            if !product.name.to_lowercase().contains(pattern.as_str()) {
                return false;
            }
        }

        self.query.matches_price(product.price) && self.query.matches_quantity(product.quantity)
    }
}

/// One page of listing results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPage {
    /// Matching products on this page, ordered by id
    pub items: Vec<Product>,
    /// Number of matches across all pages
    pub total: usize,
}

impl ProductPage {
    /// An empty page reporting `total` matches
    #[must_use]
    pub const fn empty(total: usize) -> Self {
        Self {
            items: Vec::new(),
            total,
        }
    }
}
