//! OpenCode Zen pass-through pipeline.
//!
//! Zen speaks the client protocols natively, so no schema translation
//! happens here: the raw request body is forwarded with the Zen API key
//! attached and the response (streaming or not) is relayed byte for byte.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use super::handlers::{claude_error, openai_error};
use super::route::Endpoint;

pub const DEFAULT_ZEN_BASE_URL: &str = "https://opencode.ai/zen/v1";

#[derive(Debug, Clone)]
pub struct ZenConfig {
    pub api_key: Option<String>,
    pub base_url: String,
}

impl Default for ZenConfig {
    fn default() -> Self {
        Self { api_key: None, base_url: DEFAULT_ZEN_BASE_URL.to_string() }
    }
}

fn endpoint_path(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::ChatCompletions => "/chat/completions",
        Endpoint::Messages => "/messages",
        Endpoint::Models => "/models",
    }
}

/// Protocol-shaped auth error for the endpoint's client family.
fn missing_key_error(endpoint: Endpoint) -> Response {
    let message = "No Zen API key configured. Please run login first.";
    match endpoint {
        Endpoint::Messages => claude_error(StatusCode::UNAUTHORIZED, "authentication_error", message),
        _ => openai_error(StatusCode::UNAUTHORIZED, "auth_error", message),
    }
}

/// Forward a request to Zen and relay the response unchanged.
pub async fn forward(
    http: &reqwest::Client,
    config: &ZenConfig,
    endpoint: Endpoint,
    body: Bytes,
) -> Response {
    let Some(api_key) = config.api_key.as_deref() else {
        return missing_key_error(endpoint);
    };

    let url = format!("{}{}", config.base_url.trim_end_matches('/'), endpoint_path(endpoint));
    let request = match endpoint {
        Endpoint::Models => http.get(&url),
        _ => http.post(&url).header(header::CONTENT_TYPE, "application/json").body(body),
    };

    let response = match request.bearer_auth(api_key).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Zen request failed: {}", e);
            return match endpoint {
                Endpoint::Messages => claude_error(
                    StatusCode::BAD_GATEWAY,
                    "api_error",
                    &format!("Zen request failed: {e}"),
                ),
                _ => openai_error(
                    StatusCode::BAD_GATEWAY,
                    "api_error",
                    &format!("Zen request failed: {e}"),
                ),
            };
        }
    };

    let status = StatusCode::from_u16(response.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    let mut builder = Response::builder().status(status).header(header::CONTENT_TYPE, content_type);
    if status == StatusCode::OK {
        builder = builder.header(header::CACHE_CONTROL, "no-cache");
    }

    builder
        .body(Body::from_stream(response.bytes_stream()))
        .unwrap_or_else(|e| {
            tracing::error!("Failed to relay Zen response: {}", e);
            StatusCode::BAD_GATEWAY.into_response()
        })
}
