//! Environment-driven gateway configuration.

use std::path::PathBuf;

use aerogate_core::proxy::route::ModeFlags;
use aerogate_core::proxy::zen::{ZenConfig, DEFAULT_ZEN_BASE_URL};

/// Directory name for gateway data under the home directory.
pub const DATA_DIR: &str = ".aerogate";
/// Pool document for the Antigravity provider.
pub const ANTIGRAVITY_ACCOUNTS_FILE: &str = "antigravity-accounts.json";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub mode: ModeFlags,
    pub zen: ZenConfig,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<String>,
}

impl GatewayConfig {
    /// Resolve configuration from the environment.
    ///
    /// `AEROGATE_DATA_DIR` overrides the default `~/.aerogate` (container
    /// deployments); `AEROGATE_MODE` is `zen` or `antigravity`.
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = match std::env::var("AEROGATE_DATA_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Cannot resolve home directory"))?
                .join(DATA_DIR),
        };

        let mode = match std::env::var("AEROGATE_MODE").ok().as_deref() {
            Some("zen") => ModeFlags { zen_mode: true, antigravity_mode: false },
            Some("antigravity") => ModeFlags { zen_mode: false, antigravity_mode: true },
            _ => ModeFlags::default(),
        };

        let zen = ZenConfig {
            api_key: std::env::var("ZEN_API_KEY").ok().filter(|k| !k.is_empty()),
            base_url: std::env::var("ZEN_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ZEN_BASE_URL.to_string()),
        };

        Ok(Self {
            host: std::env::var("AEROGATE_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("AEROGATE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4141),
            data_dir,
            mode,
            zen,
            oauth_client_id: std::env::var("ANTIGRAVITY_CLIENT_ID").ok(),
            oauth_client_secret: std::env::var("ANTIGRAVITY_CLIENT_SECRET").ok(),
        })
    }

    pub fn accounts_path(&self) -> PathBuf {
        self.data_dir.join(ANTIGRAVITY_ACCOUNTS_FILE)
    }
}
