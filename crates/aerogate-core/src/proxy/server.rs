//! Gateway context and router assembly.
//!
//! All shared state lives in one explicit [`GatewayContext`] passed to every
//! handler through axum `State`; there are no process-wide globals. Pool
//! mutations go exclusively through [`CredentialPool`] methods.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::CredentialPool;
use crate::proxy::handlers;
use crate::proxy::route::{self, Endpoint, ModeFlags, Provider};
use crate::proxy::upstream::UpstreamClient;
use crate::proxy::zen::{self, ZenConfig};

const MAX_BODY_SIZE: usize = 100 * 1024 * 1024;

pub struct GatewayContext {
    pub mode: ModeFlags,
    pub antigravity: Arc<CredentialPool>,
    pub upstream: Arc<UpstreamClient>,
    pub zen: ZenConfig,
    /// Client for the Zen pass-through pipeline.
    pub http: reqwest::Client,
}

impl GatewayContext {
    pub fn new(mode: ModeFlags, antigravity: Arc<CredentialPool>, zen: ZenConfig) -> Self {
        Self {
            mode,
            antigravity,
            upstream: Arc::new(UpstreamClient::new()),
            zen,
            http: reqwest::Client::new(),
        }
    }

    /// Swap the upstream client (tests point it at a mock server).
    pub fn with_upstream(mut self, upstream: UpstreamClient) -> Self {
        self.upstream = Arc::new(upstream);
        self
    }
}

/// Assemble the inbound HTTP surface. Every gateway path family goes
/// through [`route::resolve`]; only the liveness root is registered
/// directly.
pub fn build_router(ctx: Arc<GatewayContext>) -> Router {
    Router::new()
        .route("/", get(|| async { "Aerogate running" }))
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

async fn dispatch(State(ctx): State<Arc<GatewayContext>>, req: Request) -> Response {
    let path = req.uri().path().to_string();

    let Some(target) = route::resolve(&ctx.mode, &path) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let expected = match target.endpoint {
        Endpoint::Models => Method::GET,
        _ => Method::POST,
    };
    if req.method() != expected {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let body = match axum::body::to_bytes(req.into_body(), MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Rejecting oversized or unreadable body: {}", e);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    match target.provider {
        Provider::Zen => zen::forward(&ctx.http, &ctx.zen, target.endpoint, body).await,
        Provider::Antigravity => match target.endpoint {
            Endpoint::ChatCompletions => handlers::openai::chat_completions(&ctx, body).await,
            Endpoint::Messages => handlers::claude::messages(&ctx, body).await,
            Endpoint::Models => handlers::openai::list_models().await,
        },
    }
}
