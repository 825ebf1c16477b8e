//! Custom Axum extractors.
//!
//! - `Trace`: the request's [`TraceId`], as attached by the trace-id layer
//!
//! # Examples
//!
//! ```ignore
//! use product_catalog_web::extractors::Trace;
//!
//! async fn handler(Trace(trace_id): Trace) -> String {
//!     tracing::info!(trace_id = %trace_id, "Processing request");
//!     trace_id.to_string()
//! }
//! ```

use crate::middleware::TRACE_ID_HEADER;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use product_catalog_core::TraceId;

/// Trace id of the current request.
///
/// Taken from request extensions when the trace-id layer is installed.
/// Without it, falls back to the `X-Trace-ID` header and finally to
/// [`TraceId::unknown`].
#[derive(Debug, Clone)]
pub struct Trace(pub TraceId);

#[async_trait]
impl<S> FromRequestParts<S> for Trace
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(trace_id) = parts.extensions.get::<TraceId>() {
            return Ok(Self(trace_id.clone()));
        }

        let trace_id = parts
            .headers
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.trim().is_empty())
            .map_or_else(TraceId::unknown, TraceId::new);

        Ok(Self(trace_id))
    }
}
