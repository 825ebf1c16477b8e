//! Product record types.
//!
//! A product is identified by a store-assigned [`ProductId`]; everything else
//! about it lives in [`ProductFields`], which is what callers supply on create
//! and update.

use serde::{Deserialize, Serialize};

/// Unique identifier for a product, assigned by the store.
///
/// Identifiers start at 0, increase by one per created product, and are never
/// reused after deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Creates a `ProductId` from its raw value
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The caller-controlled fields of a product.
///
/// Presence and range checks (non-empty name, non-negative price and quantity)
/// belong to the calling layer; the store accepts these values as given.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductFields {
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub quantity: i64,
}

impl ProductFields {
    /// Creates a new set of product fields
    #[must_use]
    pub fn new(name: impl Into<String>, price: f64, quantity: i64) -> Self {
        Self {
            name: name.into(),
            price,
            quantity,
        }
    }
}

/// A stored product.
///
/// Values of this type handed out by the store are owned snapshots; mutating
/// one never affects the stored record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Store-assigned identifier, immutable after creation
    pub id: ProductId,
    /// Display name
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Units in stock
    pub quantity: i64,
}

impl Product {
    /// Builds a product from an identifier and its fields
    #[must_use]
    pub fn from_fields(id: ProductId, fields: ProductFields) -> Self {
        Self {
            id,
            name: fields.name,
            price: fields.price,
            quantity: fields.quantity,
        }
    }

    /// Overwrites name, price and quantity, leaving the id untouched
    pub fn apply(&mut self, fields: ProductFields) {
        self.name = fields.name;
        self.price = fields.price;
        self.quantity = fields.quantity;
    }

    /// Returns the caller-controlled fields of this product
    #[must_use]
    pub fn fields(&self) -> ProductFields {
        ProductFields {
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_preserves_id() {
        let fields = ProductFields::new("Tea", 3.0, 5);
        let mut product = Product::from_fields(ProductId::new(7), fields);
        product.apply(ProductFields::new("Green tea", 4.5, 9));

        assert_eq!(product.id, ProductId::new(7));
        assert_eq!(product.name, "Green tea");
        assert_eq!(product.price, 4.5);
        assert_eq!(product.quantity, 9);
    }

    #[test]
    fn test_product_id_serializes_as_number() {
        let json = serde_json::to_string(&ProductId::new(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_product_json_shape() {
        let product = Product::from_fields(ProductId::new(1), ProductFields::new("Mug", 8.0, 12));
        let value = serde_json::to_value(&product).unwrap();

        assert_eq!(value["id"], 1);
        assert_eq!(value["name"], "Mug");
        assert_eq!(value["quantity"], 12);
    }
}
