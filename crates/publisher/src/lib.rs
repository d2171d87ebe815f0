//! Publishing the persisted token file to a remote repository.
//!
//! [`Publisher`] is the seam the job runner depends on; [`GithubPublisher`]
//! implements it on top of the GitHub contents API (create when absent,
//! update with the current blob sha otherwise).

pub mod error;
pub mod github;

use async_trait::async_trait;

pub use error::PublishError;
pub use github::{GithubConfig, GithubPublisher};

/// What the remote store did with the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    Updated,
}

/// Pushes bytes to a named location in a remote store.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, path: &str, content: &[u8]) -> Result<PublishOutcome, PublishError>;
}
