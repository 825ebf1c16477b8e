//! Product API endpoints.
//!
//! - POST /products - Create a product
//! - GET /products/:id - Get one product
//! - PUT /products/:id - Replace a product's fields
//! - DELETE /products/:id - Delete a product (notifies in the background)
//! - GET /products - Filtered, paginated listing

use crate::error::AppError;
use crate::extractors::Trace;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use product_catalog_core::{ExclusiveRange, ListQuery, Product, ProductFields, ProductId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::info;

/// Page used when `page` is absent
pub const DEFAULT_PAGE: usize = 1;
/// Page size used when `limit` is absent
pub const DEFAULT_LIMIT: usize = 10;
/// Largest accepted `limit`
pub const MAX_LIMIT: usize = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRequest {
    /// Display name, must not be blank
    pub name: String,
    /// Unit price, finite and not negative
    pub price: f64,
    /// Stock count, not negative
    pub quantity: i64,
}

impl ProductRequest {
    /// Check field constraints and convert to storable fields.
    ///
    /// # Errors
    ///
    /// Returns a 422 `AppError` naming the first invalid field.
    pub fn validate(self) -> Result<ProductFields, AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name must not be empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::validation(
                "price must be a finite number greater than or equal to 0",
            ));
        }
        if self.quantity < 0 {
            return Err(AppError::validation(
                "quantity must be greater than or equal to 0",
            ));
        }

        Ok(ProductFields::new(self.name, self.price, self.quantity))
    }
}

/// Response after creating a product.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProductResponse {
    /// Assigned product id
    pub id: ProductId,
}

/// Response for listing products.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListProductsResponse {
    /// Products on the requested page, ordered by id
    pub results: Vec<Product>,
    /// Number of matching products across all pages
    pub total: usize,
    /// Requested page
    pub page: usize,
    /// Requested page size
    pub limit: usize,
}

/// Listing parameters as they arrive in the query string.
///
/// Kept as raw pairs because `ids[]` repeats.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ListParams {
    /// 1-based page number
    pub page: Option<usize>,
    /// Page size
    pub limit: Option<usize>,
    /// Restrict to these ids
    pub ids: Vec<ProductId>,
    /// Case-insensitive name substring
    pub name: Option<String>,
    /// Exclusive lower price bound
    pub price_min: Option<f64>,
    /// Exclusive upper price bound; 0 means unbounded
    pub price_max: Option<f64>,
    /// Exclusive lower quantity bound
    pub quantity_min: Option<i64>,
    /// Exclusive upper quantity bound; 0 means unbounded
    pub quantity_max: Option<i64>,
}

impl ListParams {
    /// Parse query pairs. Unknown keys are ignored, empty values count as absent.
    ///
    /// # Errors
    ///
    /// Returns a 400 `AppError` when a numeric parameter does not parse.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, AppError> {
        let mut params = Self::default();

        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "page" => params.page = Some(parse_param(&key, &value)?),
                "limit" => params.limit = Some(parse_param(&key, &value)?),
                "ids[]" | "ids" => params.ids.push(ProductId::new(parse_param(&key, &value)?)),
                "name" => params.name = Some(value),
                "price_min" => params.price_min = Some(parse_param(&key, &value)?),
                "price_max" => params.price_max = Some(parse_param(&key, &value)?),
                "quantity_min" => params.quantity_min = Some(parse_param(&key, &value)?),
                "quantity_max" => params.quantity_max = Some(parse_param(&key, &value)?),
                _ => {}
            }
        }

        Ok(params)
    }

    /// Validate and build the store query.
    ///
    /// A price or quantity range is applied only when one of its bounds is
    /// given. A missing minimum is 0; a missing (or zero) maximum is the
    /// type's maximum.
    ///
    /// # Errors
    ///
    /// Returns a 422 `AppError` for out-of-range values.
    pub fn into_query(self) -> Result<ListQuery, AppError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);

        if page < 1 {
            return Err(AppError::validation("page must be at least 1"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        for (name, bound) in [("price_min", self.price_min), ("price_max", self.price_max)] {
            if bound.is_some_and(|v| !v.is_finite() || v < 0.0) {
                return Err(AppError::validation(format!(
                    "{name} must be a finite number greater than or equal to 0"
                )));
            }
        }
        for (name, bound) in [
            ("quantity_min", self.quantity_min),
            ("quantity_max", self.quantity_max),
        ] {
            if bound.is_some_and(|v| v < 0) {
                return Err(AppError::validation(format!(
                    "{name} must be greater than or equal to 0"
                )));
            }
        }

        let mut query = ListQuery::new(page, limit).with_ids(self.ids);
        if let Some(name) = self.name {
            query = query.with_name(name);
        }
        if self.price_min.is_some() || self.price_max.is_some() {
            query = query.with_price(ExclusiveRange::new(
                self.price_min.unwrap_or(0.0),
                self.price_max.filter(|max| *max > 0.0).unwrap_or(f64::MAX),
            ));
        }
        if self.quantity_min.is_some() || self.quantity_max.is_some() {
            query = query.with_quantity(ExclusiveRange::new(
                self.quantity_min.unwrap_or(0),
                self.quantity_max.filter(|max| *max > 0).unwrap_or(i64::MAX),
            ));
        }

        Ok(query)
    }
}

fn parse_param<T: FromStr>(key: &str, value: &str) -> Result<T, AppError> {
    value.trim().parse().map_err(|_| {
        AppError::bad_request(format!(
            "Invalid query parameters: `{key}` has invalid value `{value}`"
        ))
    })
}

/// Parse a path segment as a product id.
///
/// # Errors
///
/// Returns a 400 `AppError` when the segment is not a 64-bit integer.
pub fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    raw.parse::<i64>()
        .map(ProductId::new)
        .map_err(|e| AppError::bad_request(format!("Invalid ID format: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a product.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/products \
///   -H "Content-Type: application/json" \
///   -H "X-Trace-ID: checkout-123" \
///   -d '{"name": "Espresso beans", "price": 12.5, "quantity": 40}'
/// ```
///
/// # Errors
///
/// 400 for malformed JSON, 422 for invalid fields, 500 if the store fails.
pub async fn create_product(
    State(state): State<AppState>,
    Trace(trace_id): Trace,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateProductResponse>), AppError> {
    let Json(request) = payload?;
    let fields = request.validate()?;

    let id = state.store.add_product(&trace_id, fields)?;

    info!(trace_id = %trace_id, product_id = %id, "Product added successfully");
    Ok((StatusCode::CREATED, Json(CreateProductResponse { id })))
}

/// Get a product by id.
///
/// # Errors
///
/// 400 for a malformed id, 404 if absent, 500 if the store fails.
pub async fn get_product(
    State(state): State<AppState>,
    Trace(trace_id): Trace,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(raw_id) = path?;
    let id = parse_product_id(&raw_id)?;

    state
        .store
        .get_product(&trace_id, id)?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Product", id))
}

/// Replace a product's fields, keeping its id.
///
/// # Errors
///
/// 400 for a malformed id or body, 422 for invalid fields, 404 if absent,
/// 500 if the store fails.
pub async fn update_product(
    State(state): State<AppState>,
    Trace(trace_id): Trace,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(raw_id) = path?;
    let id = parse_product_id(&raw_id)?;
    let Json(request) = payload?;
    let fields = request.validate()?;

    let product = state
        .store
        .update_product(&trace_id, id, fields)?
        .ok_or_else(|| AppError::not_found("Product", id))?;

    info!(trace_id = %trace_id, product_id = %id, "Product updated successfully");
    Ok(Json(product))
}

/// Delete a product.
///
/// Responds as soon as the product is gone; the deletion notice is
/// delivered in the background.
///
/// # Errors
///
/// 400 for a malformed id, 404 if absent, 500 if the store fails.
pub async fn delete_product(
    State(state): State<AppState>,
    Trace(trace_id): Trace,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(raw_id) = path?;
    let id = parse_product_id(&raw_id)?;

    if state.store.delete_product(&trace_id, id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Product", id))
    }
}

/// List products with filters and pagination.
///
/// # Example
///
/// ```bash
/// curl 'http://localhost:8080/products?page=1&limit=10&ids[]=1&ids[]=2&name=premium&price_min=5&price_max=50'
/// ```
///
/// # Errors
///
/// 400 for unparseable parameters, 422 for out-of-range ones, 500 if the
/// store fails.
pub async fn list_products(
    State(state): State<AppState>,
    Trace(trace_id): Trace,
    raw: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<ListProductsResponse>, AppError> {
    let Query(pairs) = raw?;
    let query = ListParams::from_pairs(pairs)?.into_query()?;

    let page = state.store.list_products(&trace_id, &query)?;

    Ok(Json(ListProductsResponse {
        results: page.items,
        total: page.total,
        page: query.page,
        limit: query.page_size,
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn request(name: &str, price: f64, quantity: i64) -> ProductRequest {
        ProductRequest {
            name: name.to_string(),
            price,
            quantity,
        }
    }

    #[test]
    fn test_validate_accepts_zero_price_and_quantity() {
        let fields = request("Sample", 0.0, 0).validate().unwrap();
        assert_eq!(fields, ProductFields::new("Sample", 0.0, 0));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        for bad in [
            request("  ", 1.0, 1),
            request("Mug", -0.01, 1),
            request("Mug", f64::NAN, 1),
            request("Mug", 1.0, -1),
        ] {
            let err = bad.validate().unwrap_err();
            assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[test]
    fn test_defaults() {
        let query = ListParams::from_pairs(Vec::new())
            .unwrap()
            .into_query()
            .unwrap();
        assert_eq!(query, ListQuery::new(DEFAULT_PAGE, DEFAULT_LIMIT));
    }

    #[test]
    fn test_repeated_ids_are_collected() {
        let raw = [("ids[]", "3"), ("ids[]", "1"), ("ids", "7")];
        let params = ListParams::from_pairs(pairs(&raw)).unwrap();
        let ids: Vec<i64> = params.ids.iter().map(|id| id.get()).collect();
        assert_eq!(ids, vec![3, 1, 7]);
    }

    #[test]
    fn test_unparseable_number_is_bad_request() {
        let err = ListParams::from_pairs(pairs(&[("page", "two")])).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ListParams::from_pairs(pairs(&[("ids[]", "x")])).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_out_of_range_values_fail_validation() {
        for raw in [
            [("page", "0")],
            [("limit", "0")],
            [("limit", "101")],
            [("price_min", "-1")],
            [("quantity_max", "-5")],
        ] {
            let err = ListParams::from_pairs(pairs(&raw))
                .unwrap()
                .into_query()
                .unwrap_err();
            assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY, "{raw:?}");
        }
    }

    #[test]
    fn test_range_applied_only_when_a_bound_is_given() {
        let query = ListParams::from_pairs(pairs(&[("name", "mug")]))
            .unwrap()
            .into_query()
            .unwrap();
        assert!(query.price.is_none());
        assert!(query.quantity.is_none());

        let query = ListParams::from_pairs(pairs(&[("price_min", "5")]))
            .unwrap()
            .into_query()
            .unwrap();
        assert_eq!(query.price, Some(ExclusiveRange::new(5.0, f64::MAX)));

        let query = ListParams::from_pairs(pairs(&[("quantity_max", "100")]))
            .unwrap()
            .into_query()
            .unwrap();
        assert_eq!(query.quantity, Some(ExclusiveRange::new(0, 100)));
    }

    #[test]
    fn test_zero_maximum_means_unbounded() {
        let raw = [("quantity_min", "10"), ("quantity_max", "0")];
        let query = ListParams::from_pairs(pairs(&raw))
            .unwrap()
            .into_query()
            .unwrap();
        assert_eq!(query.quantity, Some(ExclusiveRange::new(10, i64::MAX)));
    }

    #[test]
    fn test_parse_product_id() {
        assert_eq!(parse_product_id("42").unwrap(), ProductId::new(42));
        assert_eq!(
            parse_product_id("abc").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
