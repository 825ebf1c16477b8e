//! Product catalog HTTP server.
//!
//! In-memory product CRUD with filtered listing, per-process rate limiting
//! and background deletion notifications.

use product_catalog_runtime::metrics::MetricsExporter;
use product_catalog_runtime::{
    ConsoleNotificationSink, NotificationDispatcher, NotificationQueue, ProductStore,
    SlidingWindowRateLimiter,
};
use product_catalog_web::{build_router, AppState, Config};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal outside development.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "product_catalog=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    info!("Starting Product Catalog HTTP Server");

    let config = Config::from_env();
    let window_ms = u64::try_from(config.rate_limit.window.as_millis()).unwrap_or(u64::MAX);
    info!(
        address = %config.bind_address(),
        rate_limit_requests = config.rate_limit.requests,
        rate_limit_window_ms = window_ms,
        metrics_enabled = config.metrics_enabled,
        "Configuration loaded"
    );

    let mut exporter = MetricsExporter::new();
    if config.metrics_enabled {
        exporter.install()?;
    }

    // Deletion notifications
    let (queue, receiver) = NotificationQueue::channel();
    let sink = Arc::new(ConsoleNotificationSink::new(config.notifications.latency));
    let dispatcher = NotificationDispatcher::spawn(receiver, sink);

    let store = Arc::new(ProductStore::new(queue));
    let limiter = Arc::new(SlidingWindowRateLimiter::with_window(
        config.rate_limit.requests,
        config.rate_limit.window,
    ));

    let state = AppState::new(store).with_metrics(exporter.handle().cloned());
    let app = build_router(state, limiter);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped, draining deletion notifications");
    match dispatcher.drain(config.server.shutdown_timeout).await {
        Ok(()) => info!("Shutdown complete"),
        Err(remaining) => warn!(remaining = remaining, "Exiting with notifications in flight"),
    }

    Ok(())
}

/// Graceful shutdown signal handler.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
