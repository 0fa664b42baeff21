//! Per-provider credential pool manager.
//!
//! All pool mutations (refresh, rotate, disable) run behind one
//! `tokio::sync::Mutex` per provider and persist before the lock is
//! released. Serializing mutations also settles the disable-vs-late-refresh
//! race: a disable issued while a refresh is in flight is applied after it
//! and wins, because it is the last write to the slot.

use tokio::sync::Mutex;

use super::account::{Account, AccountPool};
use super::oauth::OAuthClient;
use super::store::PoolStore;
use crate::error::GatewayResult;

pub struct CredentialPool {
    store: PoolStore,
    oauth: OAuthClient,
    pool: Mutex<AccountPool>,
}

impl CredentialPool {
    /// Load the pool document (empty when absent) and wrap it.
    pub fn load(store: PoolStore, oauth: OAuthClient) -> GatewayResult<Self> {
        let pool = store.load()?;
        if !pool.is_empty() {
            tracing::info!(
                "Loaded {} account(s) ({} enabled) from {:?}",
                pool.len(),
                pool.enabled_count(),
                store.path()
            );
        }
        Ok(Self { store, oauth, pool: Mutex::new(pool) })
    }

    /// In-memory copy of the current pool state.
    pub async fn snapshot(&self) -> AccountPool {
        self.pool.lock().await.clone()
    }

    /// The account that would serve the next request, if any.
    pub async fn active_account(&self) -> Option<Account> {
        self.pool.lock().await.active_account().cloned()
    }

    /// Advance the rotation cursor and persist.
    pub async fn rotate(&self) -> GatewayResult<()> {
        let mut pool = self.pool.lock().await;
        pool.rotate();
        self.store.save(&pool)?;
        tracing::info!("Rotated credential pool to account {}", pool.current_index);
        Ok(())
    }

    /// Disable the account at the cursor, rotate away from it, persist.
    pub async fn disable_current(&self) -> GatewayResult<()> {
        let mut pool = self.pool.lock().await;
        let disabled = pool.current_index;
        pool.disable_current();
        self.store.save(&pool)?;
        tracing::warn!(
            "Disabled account {} ({} of {} still enabled)",
            disabled,
            pool.enabled_count(),
            pool.len()
        );
        Ok(())
    }

    /// Append a freshly authorized account and persist.
    pub async fn add_account(&self, account: Account) -> GatewayResult<()> {
        let mut pool = self.pool.lock().await;
        pool.accounts.push(account);
        self.store.save(&pool)?;
        tracing::info!("Added account ({} total)", pool.len());
        Ok(())
    }

    /// Drop every account and remove the pool document (logout).
    pub async fn clear(&self) -> GatewayResult<()> {
        let mut pool = self.pool.lock().await;
        *pool = AccountPool::default();
        self.store.clear()
    }

    /// Resolve a usable access token, refreshing the active account when its
    /// token is expired.
    ///
    /// On refresh failure the account is disabled and resolution retries
    /// against the mutated pool, bounded to at most one attempt per account
    /// so a pool whose every refresh fails terminates with `Ok(None)` rather
    /// than looping. `Ok(None)` means "no usable credential"; `Err` is
    /// reserved for persistence failures.
    pub async fn get_valid_access_token(&self) -> GatewayResult<Option<String>> {
        let mut pool = self.pool.lock().await;

        let attempts = pool.len();
        for _ in 0..attempts {
            let Some(idx) = pool.active_index() else {
                return Ok(None);
            };
            let account = pool.accounts[idx].clone();

            if !account.is_expired() {
                return Ok(Some(account.access_token));
            }

            tracing::info!("Access token for account {} expired, refreshing", idx);
            match self.oauth.refresh(&account.refresh_token).await {
                Ok(token) => {
                    let slot = &mut pool.accounts[idx];
                    slot.access_token = token.access_token.clone();
                    slot.expires_in = token.expires_in;
                    slot.timestamp = chrono::Utc::now().timestamp_millis();
                    if let Some(refresh_token) = token.refresh_token {
                        slot.refresh_token = refresh_token;
                    }
                    self.store.save(&pool)?;
                    return Ok(Some(token.access_token));
                }
                Err(e) => {
                    tracing::warn!("Token refresh failed for account {}: {}", idx, e);
                    pool.current_index = idx;
                    pool.disable_current();
                    self.store.save(&pool)?;
                }
            }
        }

        Ok(None)
    }
}
