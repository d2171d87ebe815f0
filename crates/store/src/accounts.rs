//! Account Source: the credential batch for one job run.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokensync_core::{validate_batch, Account};

use crate::error::StoreError;

/// Provides a fresh credential batch on every call. Nothing is cached.
#[async_trait]
pub trait AccountSource: Send + Sync {
    async fn load(&self) -> Result<Vec<Account>, StoreError>;
}

/// Reads `[{"uid": "...", "password": "..."}]` from a JSON file.
#[derive(Debug, Clone)]
pub struct JsonAccountFile {
    path: PathBuf,
}

impl JsonAccountFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AccountSource for JsonAccountFile {
    async fn load(&self) -> Result<Vec<Account>, StoreError> {
        let raw = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;

        let accounts: Vec<Account> =
            serde_json::from_slice(&raw).map_err(|e| StoreError::json(&self.path, e))?;
        validate_batch(&accounts)?;

        tracing::debug!(
            path = %self.path.display(),
            count = accounts.len(),
            "Loaded accounts"
        );
        Ok(accounts)
    }
}
