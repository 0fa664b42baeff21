//! Gateway request path: translation, streaming re-encoding, upstream
//! invocation, and routing.

pub mod handlers;
pub mod mappers;
pub mod route;
pub mod server;
pub mod streaming;
pub mod upstream;
pub mod zen;

pub use route::{Endpoint, ModeFlags, Provider};
pub use server::GatewayContext;
pub use upstream::UpstreamClient;
