//! HTTP request handlers.

pub mod health;
pub mod metrics;
pub mod products;

pub use health::health_check;
pub use metrics::render_metrics;
pub use products::{create_product, delete_product, get_product, list_products, update_product};
