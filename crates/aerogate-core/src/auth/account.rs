//! Account and pool data model.
//!
//! Field names match the on-disk JSON document
//! (`{"accounts": [...], "currentIndex": N}`); a legacy bare array of
//! accounts is accepted by the store with `currentIndex = 0`.

use serde::{Deserialize, Serialize};

/// Tokens are refreshed this long before their nominal expiry (5 minutes).
pub const REFRESH_SKEW_MS: i64 = 5 * 60 * 1000;

/// One OAuth-authenticated upstream identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub access_token: String,
    pub refresh_token: String,
    /// Token lifetime in seconds, as returned by the token endpoint.
    pub expires_in: i64,
    /// Issue time, unix milliseconds.
    pub timestamp: i64,
    pub enable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl Account {
    /// Whether the access token is past (or within the skew window of) its
    /// expiry at `now_ms`.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.timestamp + self.expires_in * 1000 - REFRESH_SKEW_MS
    }

    /// Expiry check against the current wall clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp_millis())
    }
}

/// Ordered account pool with a rotation cursor.
///
/// Insertion order is rotation order. `current_index` is only meaningful
/// while the pool is non-empty; every accessor scans for an *enabled*
/// account rather than dereferencing the cursor blindly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountPool {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default, rename = "currentIndex")]
    pub current_index: usize,
}

impl AccountPool {
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.accounts.iter().filter(|a| a.enable).count()
    }

    /// Index of the account that should serve the next request: the cursor
    /// itself when enabled, otherwise the first enabled account scanning
    /// forward from the cursor with wraparound. `None` when no account is
    /// enabled (or the pool is empty).
    pub fn active_index(&self) -> Option<usize> {
        let total = self.accounts.len();
        if total == 0 {
            return None;
        }
        let start = self.current_index.min(total - 1);
        (0..total).map(|offset| (start + offset) % total).find(|&idx| self.accounts[idx].enable)
    }

    /// The account selected by [`active_index`](Self::active_index).
    pub fn active_account(&self) -> Option<&Account> {
        self.active_index().map(|idx| &self.accounts[idx])
    }

    /// Advance the cursor to the next enabled account.
    ///
    /// No-op for pools of one account or fewer. Scans forward with
    /// wraparound, bounded by one full pass, so a pool with zero enabled
    /// accounts terminates without moving the cursor anywhere useful.
    pub fn rotate(&mut self) {
        let total = self.accounts.len();
        if total <= 1 {
            return;
        }
        let mut next = (self.current_index + 1) % total;
        let mut attempts = 0;
        while !self.accounts[next].enable && attempts < total {
            next = (next + 1) % total;
            attempts += 1;
        }
        self.current_index = next;
    }

    /// Disable the account at the cursor, then rotate away from it.
    pub fn disable_current(&mut self) {
        if let Some(account) = self.accounts.get_mut(self.current_index) {
            account.enable = false;
        }
        self.rotate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(tag: &str, enable: bool) -> Account {
        Account {
            access_token: format!("at-{tag}"),
            refresh_token: format!("rt-{tag}"),
            expires_in: 3600,
            timestamp: chrono::Utc::now().timestamp_millis(),
            enable,
            project_id: None,
        }
    }

    fn pool(enables: &[bool], current_index: usize) -> AccountPool {
        AccountPool {
            accounts: enables
                .iter()
                .enumerate()
                .map(|(i, &e)| account(&i.to_string(), e))
                .collect(),
            current_index,
        }
    }

    #[test]
    fn test_expiry_uses_refresh_skew() {
        let mut acc = account("a", true);
        acc.timestamp = 1_000_000;
        acc.expires_in = 3600;
        let expiry = acc.timestamp + 3600 * 1000;

        assert!(!acc.is_expired_at(expiry - REFRESH_SKEW_MS - 1));
        assert!(acc.is_expired_at(expiry - REFRESH_SKEW_MS + 1));
        assert!(acc.is_expired_at(expiry + 1));
    }

    #[test]
    fn test_active_account_empty_pool() {
        assert!(AccountPool::default().active_account().is_none());
    }

    #[test]
    fn test_active_account_prefers_cursor() {
        let p = pool(&[true, true, true], 1);
        assert_eq!(p.active_index(), Some(1));
    }

    #[test]
    fn test_active_account_scans_forward_with_wrap() {
        // Cursor on a disabled account: first enabled found scanning forward
        // from index 1 (wrapping) is index 2.
        let p = pool(&[true, false, true], 1);
        assert_eq!(p.active_index(), Some(2));

        // Wraps past the end back to index 0.
        let p = pool(&[true, false, false], 1);
        assert_eq!(p.active_index(), Some(0));
    }

    #[test]
    fn test_active_account_none_when_all_disabled() {
        let p = pool(&[false, false], 0);
        assert!(p.active_account().is_none());
    }

    #[test]
    fn test_rotate_visits_all_accounts_before_repeating() {
        let mut p = pool(&[true, true, true, true], 0);
        let mut seen = Vec::new();
        for _ in 0..p.len() {
            p.rotate();
            seen.push(p.current_index);
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_rotate_skips_disabled() {
        let mut p = pool(&[true, false, true], 0);
        p.rotate();
        assert_eq!(p.current_index, 2);
        p.rotate();
        assert_eq!(p.current_index, 0);
    }

    #[test]
    fn test_rotate_single_account_noop() {
        let mut p = pool(&[true], 0);
        p.rotate();
        assert_eq!(p.current_index, 0);
    }

    #[test]
    fn test_rotate_terminates_with_all_disabled() {
        let mut p = pool(&[false, false, false], 0);
        p.rotate();
        // Bounded scan found nothing enabled; the pool stays usable.
        assert!(p.current_index < p.len());
    }

    #[test]
    fn test_disable_current_never_reselects_while_others_enabled() {
        let mut p = pool(&[true, true, true], 1);
        p.disable_current();
        assert!(!p.accounts[1].enable);
        assert_ne!(p.current_index, 1);

        for _ in 0..6 {
            p.rotate();
            assert_ne!(p.current_index, 1, "rotate re-selected a disabled account");
        }
    }
}
