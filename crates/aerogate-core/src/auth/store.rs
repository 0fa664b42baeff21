//! On-disk pool persistence: one JSON document per provider.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;

use super::account::{Account, AccountPool};
use crate::error::{GatewayError, GatewayResult};

/// Whole-pool load/save against a single JSON file.
pub struct PoolStore {
    path: PathBuf,
}

impl PoolStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Load the pool. A missing file yields an empty pool; a legacy bare
    /// array of accounts is accepted with `currentIndex = 0`.
    pub fn load(&self) -> GatewayResult<AccountPool> {
        if !self.path.exists() {
            return Ok(AccountPool::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let value: Value = serde_json::from_str(&content)?;

        let pool = if value.is_array() {
            let accounts: Vec<Account> = serde_json::from_value(value)?;
            tracing::info!(
                "Loaded legacy account list ({} accounts), defaulting currentIndex to 0",
                accounts.len()
            );
            AccountPool { accounts, current_index: 0 }
        } else {
            serde_json::from_value(value)?
        };

        Ok(pool)
    }

    /// Save the pool atomically (temp file + rename).
    pub fn save(&self, pool: &AccountPool) -> GatewayResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(pool)?;

        if let Err(e) = fs::write(&temp_path, content) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            GatewayError::Io(e)
        })
    }

    /// Remove the pool document (logout).
    pub fn clear(&self) -> GatewayResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
