//! # Aerogate Core
//!
//! Gateway logic for Aerogate:
//!
//! ```text
//! aerogate-core/src/
//! ├── auth/          # Credential pools, on-disk store, OAuth client
//! ├── proxy/
//! │   ├── mappers/   # Request + non-stream response translation
//! │   ├── streaming/ # SSE re-encoder (one state machine, two wire shapes)
//! │   ├── handlers/  # Axum handlers per client protocol
//! │   ├── upstream.rs# Outbound Antigravity calls + status classification
//! │   ├── route.rs   # Pure mode/path dispatcher
//! │   └── server.rs  # GatewayContext + router assembly
//! └── error.rs
//! ```

pub mod auth;
pub mod error;
pub mod proxy;

pub use error::{GatewayError, GatewayResult};
