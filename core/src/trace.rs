//! Trace tokens for log correlation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque correlation token carried through every store operation.
///
/// It has no behavioral effect: the engine only records it in log events and
/// passes it on to the notification sink.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(String);

impl TraceId {
    /// Wraps a caller-supplied token
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generates a fresh random token (UUID v4)
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The token used when no trace information is available
    #[must_use]
    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }

    /// Returns the token as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::unknown()
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
