//! OAuth client for the Antigravity provider (Google token endpoint).
//!
//! Covers the three credential operations the gateway needs: refresh,
//! authorization-code exchange (interactive login), and the one-shot
//! localhost callback listener used only during account setup.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use rand::Rng;
use serde::Deserialize;

use super::account::Account;
use crate::error::{truncate, GatewayError, GatewayResult};

const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";

const DEFAULT_CLIENT_ID: &str =
    "1071006060591-tmhssin2h21lcre235vtolojh4g403ep.apps.googleusercontent.com";
const DEFAULT_CLIENT_SECRET: &str = "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";

/// Port the OAuth redirect URI points at.
pub const CALLBACK_PORT: u16 = 8046;
const REDIRECT_URI: &str = "http://localhost:8046/callback";

/// Hard bound on the interactive authorization wait.
pub const SETUP_WAIT: Duration = Duration::from_secs(5 * 60);

const OAUTH_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/cloud-platform",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/cclog",
    "https://www.googleapis.com/auth/experimentsandconfigs",
];

/// Token endpoint response. `refresh_token` is only present on the initial
/// code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

/// OAuth token-endpoint client.
pub struct OAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
}

impl OAuthClient {
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: client_id.unwrap_or_else(|| DEFAULT_CLIENT_ID.to_string()),
            client_secret: client_secret.unwrap_or_else(|| DEFAULT_CLIENT_SECRET.to_string()),
            token_url: TOKEN_ENDPOINT.to_string(),
        }
    }

    /// Point the client at a different token endpoint (tests).
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }

    /// Exchange a refresh token for a fresh access token.
    ///
    /// Non-2xx or a transport failure returns an error without touching any
    /// account state; the caller decides what to do with the pool.
    pub async fn refresh(&self, refresh_token: &str) -> GatewayResult<TokenResponse> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::OAuth(format!(
                "token refresh failed ({status}): {}",
                truncate(&body, 200)
            )));
        }

        Ok(response.json().await?)
    }

    /// Exchange an authorization code for a new [`Account`].
    pub async fn exchange_code(&self, code: &str) -> GatewayResult<Account> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
            ("grant_type", "authorization_code"),
        ];

        let response = self.http.post(&self.token_url).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::OAuth(format!(
                "code exchange failed ({status}): {}",
                truncate(&body, 200)
            )));
        }

        let token: TokenResponse = response.json().await?;
        let refresh_token = token
            .refresh_token
            .ok_or_else(|| GatewayError::OAuth("code exchange returned no refresh_token".into()))?;

        Ok(Account {
            access_token: token.access_token,
            refresh_token,
            expires_in: token.expires_in,
            timestamp: chrono::Utc::now().timestamp_millis(),
            enable: true,
            project_id: Some(random_project_id()),
        })
    }

    /// The browser URL that starts the consent flow.
    pub fn authorization_url(&self) -> String {
        let mut url = url::Url::parse(AUTH_ENDPOINT).expect("static auth endpoint parses");
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", REDIRECT_URI)
            .append_pair("response_type", "code")
            .append_pair("scope", &OAUTH_SCOPES.join(" "))
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("include_granted_scopes", "true");
        url.to_string()
    }
}

/// Random 12-digit project id assigned to newly added accounts.
pub fn random_project_id() -> String {
    let mut rng = rand::thread_rng();
    (0..12).map(|_| char::from(b'0' + rng.gen_range(0..10))).collect()
}

/// Wait for the OAuth redirect on `localhost:<port>/callback`.
///
/// Serves exactly one authorization outcome: resolves with the code, fails
/// with the provider's error, or gives up after [`SETUP_WAIT`]. The listener
/// is torn down on every exit path. Used only during interactive account
/// setup, never in the request path.
pub async fn wait_for_callback(port: u16) -> GatewayResult<String> {
    let (tx, rx) = tokio::sync::oneshot::channel::<Result<String, String>>();
    let tx = Arc::new(tokio::sync::Mutex::new(Some(tx)));

    let app = Router::new().route(
        "/callback",
        get(move |Query(params): Query<HashMap<String, String>>| {
            let tx = Arc::clone(&tx);
            async move {
                let outcome = if let Some(error) = params.get("error") {
                    Err(error.clone())
                } else if let Some(code) = params.get("code") {
                    Ok(code.clone())
                } else {
                    return (
                        StatusCode::BAD_REQUEST,
                        Html("Missing authorization code".to_string()),
                    );
                };

                let page = match &outcome {
                    Ok(_) => {
                        "<html><body><h1>Authorization successful</h1>\
                         <p>You can close this window and return to the terminal.</p>\
                         </body></html>"
                    }
                    Err(_) => {
                        "<html><body><h1>Authorization failed</h1>\
                         <p>You can close this window.</p></body></html>"
                    }
                };

                if let Some(tx) = tx.lock().await.take() {
                    let _ = tx.send(outcome);
                }
                (StatusCode::OK, Html(page.to_string()))
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tracing::info!("OAuth callback listener started on http://localhost:{port}");

    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let outcome = tokio::time::timeout(SETUP_WAIT, rx).await;
    server.abort();

    match outcome {
        Err(_) => Err(GatewayError::SetupTimeout),
        Ok(Err(_)) => Err(GatewayError::OAuth("callback listener closed unexpectedly".into())),
        Ok(Ok(Ok(code))) => Ok(code),
        Ok(Ok(Err(error))) => Err(GatewayError::OAuth(format!("authorization failed: {error}"))),
    }
}
