//! Credential management: OAuth account pools with expiry tracking,
//! refresh, rotation, and failover.

pub mod account;
pub mod oauth;
pub mod pool;
pub mod store;

pub use account::{Account, AccountPool, REFRESH_SKEW_MS};
pub use oauth::OAuthClient;
pub use pool::CredentialPool;
pub use store::PoolStore;
