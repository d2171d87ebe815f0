//! Change-Gated Writer over the persisted token file.
//!
//! The file holds the last written result set as a 4-space indented JSON
//! array of `{"token": ...}` objects. A new set is written only when it
//! differs from what is on disk; an absent file always counts as different,
//! so the very first run writes even an empty set.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokensync_core::ResultSet;

use crate::error::StoreError;

/// Result of [`ChangeGatedWriter::commit_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The file was (re)written with the new set.
    Changed,
    /// The new set equals the persisted one; nothing was written.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct ChangeGatedWriter {
    path: PathBuf,
}

impl ChangeGatedWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the persisted result set.
    ///
    /// Returns `Ok(None)` when the file does not exist, or when it exists
    /// but is not a valid result set (logged, then treated as absent so the
    /// next commit replaces it).
    pub async fn read_state(&self) -> Result<Option<ResultSet>, StoreError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        match serde_json::from_slice::<ResultSet>(&raw) {
            Ok(set) => Ok(Some(set)),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Persisted token file is unreadable, treating as absent"
                );
                Ok(None)
            }
        }
    }

    /// Write `new_set` if it differs from the persisted state.
    pub async fn commit_if_changed(&self, new_set: &ResultSet) -> Result<CommitOutcome, StoreError> {
        if let Some(existing) = self.read_state().await? {
            if existing == *new_set {
                tracing::info!(
                    path = %self.path.display(),
                    tokens = new_set.len(),
                    "No changes in tokens, skipping write"
                );
                return Ok(CommitOutcome::Unchanged);
            }
        }

        let bytes = encode(new_set).map_err(|e| StoreError::json(&self.path, e))?;
        self.write_atomic(&bytes).await?;

        tracing::info!(
            path = %self.path.display(),
            tokens = new_set.len(),
            "Saved tokens"
        );
        Ok(CommitOutcome::Changed)
    }

    /// Raw bytes of the persisted file, as handed to the publisher.
    pub async fn read_bytes(&self) -> Result<Vec<u8>, StoreError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }

    /// Write to a sibling temp file, then rename over the target.
    async fn write_atomic(&self, bytes: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, e))?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| StoreError::io(&tmp_path, e))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))
    }
}

/// Serialize with 4-space indentation.
fn encode(set: &ResultSet) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    set.serialize(&mut ser)?;
    Ok(buf)
}
