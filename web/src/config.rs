//! Service configuration.
//!
//! Loaded from environment variables (a `.env` file is read first by the
//! binary). Missing or unparseable values fall back to the defaults below.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Request admission configuration
    pub rate_limit: RateLimitConfig,
    /// Deletion notification configuration
    pub notifications: NotificationConfig,
    /// Expose `/metrics` in Prometheus text format
    pub metrics_enabled: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
    /// How long shutdown waits for in-flight notifications
    pub shutdown_timeout: Duration,
}

/// Rate limiter configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub requests: usize,
    /// Window length
    pub window: Duration,
}

/// Notification sink configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Simulated delivery latency of the console sink
    pub latency: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                shutdown_timeout: Duration::from_secs(10),
            },
            rate_limit: RateLimitConfig {
                requests: 100,
                window: Duration::from_millis(1000),
            },
            notifications: NotificationConfig {
                latency: Duration::from_millis(2000),
            },
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Used by [`Config::from_env`]; tests pass a map instead of mutating the
    /// process environment.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            server: ServerConfig {
                host: lookup("HOST").unwrap_or(defaults.server.host),
                port: parse_var(&lookup, "PORT").unwrap_or(defaults.server.port),
                shutdown_timeout: parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS")
                    .map_or(defaults.server.shutdown_timeout, Duration::from_secs),
            },
            rate_limit: RateLimitConfig {
                requests: parse_var(&lookup, "RATE_LIMIT_REQUESTS")
                    .unwrap_or(defaults.rate_limit.requests),
                window: parse_var(&lookup, "RATE_LIMIT_WINDOW_MS")
                    .map_or(defaults.rate_limit.window, Duration::from_millis),
            },
            notifications: NotificationConfig {
                latency: parse_var(&lookup, "NOTIFICATION_LATENCY_MS")
                    .map_or(defaults.notifications.latency, Duration::from_millis),
            },
            metrics_enabled: lookup("METRICS_ENABLED")
                .and_then(|value| parse_flag(&value))
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Address to bind, as `host:port`.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|value| value.trim().parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "on" => Some(true),
        "0" | "no" | "off" => Some(false),
        other => bool::from_str(other).ok(),
    }
}
