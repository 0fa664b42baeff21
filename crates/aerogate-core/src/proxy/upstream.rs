//! Outbound calls to the Antigravity generation endpoints.

use serde_json::Value;

use crate::error::GatewayResult;

/// Cloud Code v1internal base (sandbox host, the one the IDE talks to).
pub const DEFAULT_BASE_URL: &str =
    "https://daily-cloudcode-pa.sandbox.googleapis.com/v1internal";

const UPSTREAM_USER_AGENT: &str = "antigravity/1.11.3 windows/amd64";

/// Pool mutation an upstream status maps to. Failover only changes which
/// credential future requests use; the failing request itself is never
/// resubmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolAction {
    /// Surface the error verbatim, leave the pool alone.
    None,
    /// Credential rejected: disable the current account.
    Disable,
    /// Transient provider failure: rotate, keep the account enabled.
    Rotate,
}

/// Classify an upstream HTTP status into the pool mutation it triggers.
pub fn classify_status(status: u16) -> PoolAction {
    match status {
        401 | 403 => PoolAction::Disable,
        429 | 503 => PoolAction::Rotate,
        _ => PoolAction::None,
    }
}

pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UpstreamClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new(), base_url: DEFAULT_BASE_URL.to_string() }
    }

    /// Point the client at a different base URL (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Call the generation endpoint selected by the request's stream flag
    /// and hand back the raw response; the caller classifies the status.
    pub async fn generate(
        &self,
        body: &Value,
        access_token: &str,
        stream: bool,
    ) -> GatewayResult<reqwest::Response> {
        let url = if stream {
            format!("{}:streamGenerateContent?alt=sse", self.base_url)
        } else {
            format!("{}:generateContent", self.base_url)
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, UPSTREAM_USER_AGENT)
            .header(reqwest::header::ACCEPT_ENCODING, "gzip")
            .json(body)
            .send()
            .await?;

        Ok(response)
    }
}
