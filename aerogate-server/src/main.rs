//! Aerogate Server - Headless Gateway Daemon
//!
//! A pure Rust HTTP gateway that lets OpenAI-style and Anthropic-style chat
//! clients reach the Antigravity backend (or OpenCode Zen) through one
//! endpoint:
//! - OpenAI family on /chat/completions, /v1/chat/completions, /models
//! - Anthropic family on /v1/messages
//! - Provider-pinned families on /zen/v1/* and /antigravity/v1/*

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use aerogate_core::auth::{oauth, CredentialPool, OAuthClient, PoolStore};
use aerogate_core::proxy::route::ModeFlags;
use aerogate_core::proxy::server::{build_router, GatewayContext};

mod config;

use config::GatewayConfig;

#[derive(Parser)]
#[command(name = "aerogate-server", about = "API gateway for Antigravity and Zen backends")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the gateway (default)
    Serve(ServeArgs),
    /// Add an Antigravity account via the interactive OAuth flow
    Login,
    /// Clear stored Antigravity accounts
    Logout,
    /// Show the credential pool state
    Status,
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Route mode-dependent paths to OpenCode Zen
    #[arg(long)]
    zen: bool,
    /// Route mode-dependent paths to Antigravity (also the default)
    #[arg(long)]
    antigravity: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = GatewayConfig::from_env()?;

    match cli.command.unwrap_or(Command::Serve(ServeArgs::default())) {
        Command::Serve(args) => serve(config, args).await,
        Command::Login => login(config).await,
        Command::Logout => logout(config).await,
        Command::Status => status(config).await,
    }
}

fn open_pool(config: &GatewayConfig) -> Result<CredentialPool> {
    let store = PoolStore::new(config.accounts_path());
    let oauth_client =
        OAuthClient::new(config.oauth_client_id.clone(), config.oauth_client_secret.clone());
    Ok(CredentialPool::load(store, oauth_client)?)
}

async fn serve(config: GatewayConfig, args: ServeArgs) -> Result<()> {
    let mode = if args.zen || args.antigravity {
        ModeFlags { zen_mode: args.zen, antigravity_mode: args.antigravity }
    } else {
        config.mode
    };

    let pool = Arc::new(open_pool(&config)?);
    let snapshot = pool.snapshot().await;
    tracing::info!(
        "Credential pool: {} account(s), {} enabled",
        snapshot.len(),
        snapshot.enabled_count()
    );
    if mode.zen_mode {
        tracing::info!("Mode: Zen (mode-dependent paths proxy to OpenCode Zen)");
    } else {
        tracing::info!("Mode: Antigravity");
    }

    let ctx = Arc::new(GatewayContext::new(mode, pool, config.zen.clone()));
    let router = build_router(ctx);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Aerogate listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

async fn login(config: GatewayConfig) -> Result<()> {
    let pool = open_pool(&config)?;
    let oauth_client =
        OAuthClient::new(config.oauth_client_id.clone(), config.oauth_client_secret.clone());

    let snapshot = pool.snapshot().await;
    if !snapshot.is_empty() {
        println!(
            "Found {} account(s) ({} enabled); adding another.",
            snapshot.len(),
            snapshot.enabled_count()
        );
    }

    println!("Open this URL in your browser and complete the Google sign-in:");
    println!("  {}", oauth_client.authorization_url());
    println!("Waiting for authorization (up to 5 minutes)...");

    let code = oauth::wait_for_callback(oauth::CALLBACK_PORT).await?;
    println!("Authorization code received, exchanging for tokens...");

    let account = oauth_client.exchange_code(&code).await?;
    pool.add_account(account).await?;
    println!("Account added to {}", config.accounts_path().display());
    Ok(())
}

async fn logout(config: GatewayConfig) -> Result<()> {
    let pool = open_pool(&config)?;
    pool.clear().await?;
    println!("Cleared Antigravity accounts at {}", config.accounts_path().display());
    Ok(())
}

async fn status(config: GatewayConfig) -> Result<()> {
    let pool = open_pool(&config)?;
    let snapshot = pool.snapshot().await;

    if snapshot.is_empty() {
        println!("No accounts. Run `aerogate-server login` to add one.");
        return Ok(());
    }

    println!(
        "{} account(s), {} enabled, cursor at {}",
        snapshot.len(),
        snapshot.enabled_count(),
        snapshot.current_index
    );
    for (idx, account) in snapshot.accounts.iter().enumerate() {
        let marker = if idx == snapshot.current_index { "*" } else { " " };
        let state = if !account.enable {
            "disabled"
        } else if account.is_expired() {
            "expired (refresh on next use)"
        } else {
            "ready"
        };
        println!("{} [{}] {}", marker, idx, state);
    }
    Ok(())
}
