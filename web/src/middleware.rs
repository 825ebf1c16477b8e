//! Axum middleware for request tracing and admission control.
//!
//! - **Trace id**: read `X-Trace-ID` (or generate one), expose it to
//!   handlers, open a span with it and echo it on the response
//! - **Rate limiting**: reject requests beyond the shared sliding-window
//!   budget with `429 Too Many Requests`
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use product_catalog_web::middleware::{rate_limit_layer, trace_id_layer};
//!
//! let app = Router::new()
//!     .route("/products", get(list_products))
//!     .layer(rate_limit_layer(limiter))
//!     .layer(trace_id_layer());
//! ```
//!
//! Layer order matters: the trace-id layer must wrap the rate-limit layer so
//! that rejected requests are still logged with their trace id.

use crate::error::AppError;
use axum::{extract::Request, http::HeaderValue, response::IntoResponse, response::Response};
use product_catalog_core::TraceId;
use product_catalog_runtime::SlidingWindowRateLimiter;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::Instrument;

/// Header carrying the caller's trace id.
pub const TRACE_ID_HEADER: &str = "X-Trace-ID";

type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send>>;

/// Create a layer that attaches a [`TraceId`] to every request.
///
/// A present, non-empty header value is used verbatim. Otherwise a UUID is
/// generated and a warning logged.
#[must_use]
pub const fn trace_id_layer() -> TraceIdLayer {
    TraceIdLayer
}

/// Layer for trace id propagation.
#[derive(Clone, Copy, Debug)]
pub struct TraceIdLayer;

impl<S> Layer<S> for TraceIdLayer {
    type Service = TraceIdMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TraceIdMiddleware { inner }
    }
}

/// Middleware service for trace id propagation.
#[derive(Clone, Debug)]
pub struct TraceIdMiddleware<S> {
    inner: S,
}

impl<S> Service<Request> for TraceIdMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let supplied = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TraceId::new);

        let trace_id = supplied.unwrap_or_else(|| {
            let generated = TraceId::generate();
            tracing::warn!(
                trace_id = %generated,
                "X-Trace-ID header not found, generated a trace id"
            );
            generated
        });

        req.extensions_mut().insert(trace_id.clone());

        let span = tracing::info_span!(
            "http_request",
            trace_id = %trace_id,
            method = %req.method(),
            uri = %req.uri(),
        );

        let fut = self.inner.call(req);

        Box::pin(async move {
            let mut response = fut.instrument(span).await?;

            if let Ok(header_value) = HeaderValue::from_str(trace_id.as_str()) {
                response.headers_mut().insert(TRACE_ID_HEADER, header_value);
            }

            Ok(response)
        })
    }
}

/// Create a layer admitting requests through `limiter`.
///
/// All services built from this layer share one budget.
#[must_use]
pub const fn rate_limit_layer(limiter: Arc<SlidingWindowRateLimiter>) -> RateLimitLayer {
    RateLimitLayer { limiter }
}

/// Layer for sliding-window admission control.
#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    limiter: Arc<SlidingWindowRateLimiter>,
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: Arc::clone(&self.limiter),
        }
    }
}

/// Middleware service rejecting requests over the admission budget.
#[derive(Clone, Debug)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Arc<SlidingWindowRateLimiter>,
}

impl<S> Service<Request> for RateLimitMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        if !self.limiter.allow() {
            let trace_id = req.extensions().get::<TraceId>().cloned().unwrap_or_default();
            tracing::warn!(
                trace_id = %trace_id,
                limit = self.limiter.limit(),
                uri = %req.uri(),
                "Request rejected by rate limiter"
            );
            let response = AppError::too_many_requests("Too many requests, please retry later")
                .into_response();
            return Box::pin(async move { Ok(response) });
        }

        Box::pin(self.inner.call(req))
    }
}
