//! Unified error types for Aerogate Core.

use serde::Serialize;
use thiserror::Error;

/// Maximum length of an upstream error body carried inside an error value.
/// Bodies are truncated before they reach logs or clients.
pub const MAX_ERROR_BODY_LEN: usize = 800;

/// Main error type for all gateway operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum GatewayError {
    /// No usable credential for the resolved provider.
    #[error("Auth error: {0}")]
    Auth(String),

    /// Non-2xx from the provider; carries status and truncated body.
    #[error("Upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    /// Unexpected or missing fields in an upstream payload.
    #[error("Transform error: {0}")]
    Transform(String),

    /// Interactive OAuth wait exceeded its bound.
    #[error("OAuth setup timed out waiting for the callback")]
    SetupTimeout,

    /// OAuth token exchange or refresh failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network request failed (HTTP client).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// File system I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GatewayError {
    /// Build an upstream error, truncating the body to [`MAX_ERROR_BODY_LEN`].
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        GatewayError::Upstream { status, body: truncate(&body.into(), MAX_ERROR_BODY_LEN) }
    }
}

impl Serialize for GatewayError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Truncate a string on a char boundary, appending an ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_len).collect();
    out.push('…');
    out
}
