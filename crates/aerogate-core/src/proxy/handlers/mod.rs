//! Axum handlers, one module per client protocol, plus the error shaping
//! each protocol expects on the wire.

pub mod claude;
pub mod openai;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use aerogate_types::gemini::{GenerateContentResponse, StreamRecord};

use crate::error::{truncate, GatewayError, GatewayResult, MAX_ERROR_BODY_LEN};
use crate::proxy::server::GatewayContext;
use crate::proxy::upstream::{classify_status, PoolAction};

/// Client-facing message for an exhausted or empty credential pool.
pub(crate) const NO_CREDENTIALS: &str =
    "No valid Antigravity access token available. Please run login first.";

/// OpenAI-shaped error body: `{"error": {"message", "type"}}`.
pub fn openai_error(status: StatusCode, error_type: &str, message: &str) -> Response {
    (status, Json(json!({ "error": { "message": message, "type": error_type } })))
        .into_response()
}

/// Anthropic-shaped error body: `{"type":"error","error":{"type","message"}}`.
pub fn claude_error(status: StatusCode, error_type: &str, message: &str) -> Response {
    (
        status,
        Json(json!({ "type": "error", "error": { "type": error_type, "message": message } })),
    )
        .into_response()
}

/// Per-request trace id for log correlation.
pub fn trace_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("req_{}", &id[..8])
}

/// A non-2xx upstream response, after the pool mutation it triggered.
pub(crate) struct UpstreamFailure {
    pub status: StatusCode,
    pub body: String,
}

/// Classify a failed upstream response, apply the resulting pool action,
/// and hand the (status, truncated body) back for the protocol-shaped
/// error. The failing request is never resubmitted; failover only affects
/// which credential future requests use.
pub(crate) async fn apply_upstream_failure(
    ctx: &GatewayContext,
    response: reqwest::Response,
    trace: &str,
) -> UpstreamFailure {
    let status = response.status().as_u16();
    let body = truncate(&response.text().await.unwrap_or_default(), MAX_ERROR_BODY_LEN);
    tracing::error!("[{}] Upstream error {}: {}", trace, status, body);

    match classify_status(status) {
        PoolAction::Disable => {
            if let Err(e) = ctx.antigravity.disable_current().await {
                tracing::error!("[{}] Failed to disable account: {}", trace, e);
            }
        }
        PoolAction::Rotate => {
            if let Err(e) = ctx.antigravity.rotate().await {
                tracing::error!("[{}] Failed to rotate pool: {}", trace, e);
            }
        }
        PoolAction::None => {}
    }

    UpstreamFailure {
        status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
        body,
    }
}

/// Read a complete upstream JSON payload, unwrapping the optional
/// `response` envelope at this one boundary.
pub(crate) async fn read_upstream_json(
    response: reqwest::Response,
) -> GatewayResult<GenerateContentResponse> {
    let text = response.text().await?;
    let record: StreamRecord = serde_json::from_str(&text)
        .map_err(|e| GatewayError::Transform(format!("unexpected upstream payload: {e}")))?;
    Ok(record.into_inner())
}

/// Headers for an outgoing SSE response.
pub fn sse_response(body: axum::body::Body) -> Response {
    Response::builder()
        .status(StatusCode::OK)
        .header(axum::http::header::CONTENT_TYPE, "text/event-stream")
        .header(axum::http::header::CACHE_CONTROL, "no-cache")
        .header(axum::http::header::CONNECTION, "keep-alive")
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
