//! OpenAI-protocol handlers backed by the Antigravity pipeline.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;

use aerogate_types::openai::ChatCompletionRequest;

use super::{openai_error, sse_response, trace_id, NO_CREDENTIALS};
use crate::proxy::mappers::{self, models};
use crate::proxy::server::GatewayContext;
use crate::proxy::streaming::{recode_stream, OpenAiFormat};

/// POST /chat/completions
pub async fn chat_completions(ctx: &GatewayContext, body: Bytes) -> Response {
    let trace = trace_id();

    let request: ChatCompletionRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return openai_error(
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                &format!("Invalid request body: {e}"),
            );
        }
    };

    tracing::info!(
        "[{}] chat completion: model={} stream={}",
        trace,
        request.model,
        request.stream
    );

    let access_token = match ctx.antigravity.get_valid_access_token().await {
        Ok(Some(token)) => token,
        Ok(None) => return openai_error(StatusCode::UNAUTHORIZED, "auth_error", NO_CREDENTIALS),
        Err(e) => {
            tracing::error!("[{}] credential resolution failed: {}", trace, e);
            return openai_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "api_error",
                "Credential pool unavailable",
            );
        }
    };

    let gemini_body = mappers::openai::build_generate_request(&request);

    let response = match ctx.upstream.generate(&gemini_body, &access_token, request.stream).await
    {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("[{}] upstream request failed: {}", trace, e);
            return openai_error(
                StatusCode::BAD_GATEWAY,
                "api_error",
                &format!("Upstream request failed: {e}"),
            );
        }
    };

    if !response.status().is_success() {
        let failure = super::apply_upstream_failure(ctx, response, &trace).await;
        return openai_error(
            failure.status,
            "api_error",
            &format!("Antigravity API error: {}: {}", failure.status.as_u16(), failure.body),
        );
    }

    if request.stream {
        let recoded =
            recode_stream(response.bytes_stream(), OpenAiFormat::new(request.model.as_str()));
        return sse_response(Body::from_stream(recoded));
    }

    match super::read_upstream_json(response).await {
        Ok(payload) => {
            Json(mappers::openai::transform_response(&payload, &request.model)).into_response()
        }
        Err(e) => {
            tracing::error!("[{}] invalid upstream payload: {}", trace, e);
            openai_error(StatusCode::BAD_GATEWAY, "api_error", "Invalid upstream payload")
        }
    }
}

/// GET /models
pub async fn list_models() -> Response {
    Json(models::model_list()).into_response()
}
