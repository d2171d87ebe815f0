//! One token sync run: Fetching → Comparing → Publishing | Idle → Done.
//!
//! Runs are serialized by a mutex held for the whole run, so a scheduled
//! run and an on-demand run never read-modify-write the persisted file at
//! the same time. A second trigger waits for the first to finish, then does
//! its own full run.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokensync_core::canonicalize;
use tokensync_fetcher::{FetchCoordinator, RetryPolicy, TokenApiClient, TokenFetcher};
use tokensync_publisher::Publisher;
use tokensync_store::{AccountSource, ChangeGatedWriter, CommitOutcome, JsonAccountFile, StoreError};
use tokio::sync::Mutex;

use crate::config::JobConfig;

/// What started a run. Only used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Schedule,
    OnDemand,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Trigger::Startup => "startup",
            Trigger::Schedule => "schedule",
            Trigger::OnDemand => "on_demand",
        })
    }
}

/// Errors that end a run early. Per-account fetch failures and publish
/// failures are not in here: they are logged and the run carries on.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to build token client: {0}")]
    Setup(String),

    #[error("Failed to load accounts: {0}")]
    LoadAccounts(#[source] StoreError),

    #[error("Failed to persist tokens: {0}")]
    Persist(#[source] StoreError),
}

impl JobError {
    /// Run stage the error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            JobError::Setup(_) => "setup",
            JobError::LoadAccounts(_) => "fetching",
            JobError::Persist(_) => "comparing",
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The result set differed and was written. `published` is false when
    /// the publisher failed; the local file is still up to date.
    Changed { tokens: usize, published: bool },
    /// The result set matched the persisted state; nothing was written.
    Unchanged { tokens: usize },
    /// The run stopped at a batch-level failure in `stage`. Nothing was
    /// written.
    Failed { stage: &'static str, error: String },
}

impl JobOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Changed { .. } => "changed",
            JobOutcome::Unchanged { .. } => "unchanged",
            JobOutcome::Failed { .. } => "failed",
        }
    }
}

/// Single-instance token sync job.
pub struct JobRunner {
    accounts: Arc<dyn AccountSource>,
    coordinator: FetchCoordinator,
    writer: ChangeGatedWriter,
    publisher: Arc<dyn Publisher>,
    publish_path: String,
    guard: Mutex<()>,
    completed_runs: AtomicU64,
}

impl JobRunner {
    pub fn new(
        accounts: Arc<dyn AccountSource>,
        coordinator: FetchCoordinator,
        writer: ChangeGatedWriter,
        publisher: Arc<dyn Publisher>,
        publish_path: impl Into<String>,
    ) -> Self {
        Self {
            accounts,
            coordinator,
            writer,
            publisher,
            publish_path: publish_path.into(),
            guard: Mutex::new(()),
            completed_runs: AtomicU64::new(0),
        }
    }

    /// Wire the production collaborators from `config`.
    pub fn from_config(config: &JobConfig, publisher: Arc<dyn Publisher>) -> Result<Self, JobError> {
        let client = TokenApiClient::new(config.token_api_url.clone(), config.fetch_timeout)
            .map_err(|e| JobError::Setup(e.to_string()))?;
        let fetcher = TokenFetcher::new(
            Arc::new(client),
            RetryPolicy::new(config.max_retries, config.retry_delay),
        );

        Ok(Self::new(
            Arc::new(JsonAccountFile::new(&config.accounts_file)),
            FetchCoordinator::new(fetcher, config.max_concurrency),
            ChangeGatedWriter::new(&config.tokens_file),
            publisher,
            config.publish_path.clone(),
        ))
    }

    /// Number of runs that have finished, whatever their outcome.
    pub fn completed_runs(&self) -> u64 {
        self.completed_runs.load(Ordering::Relaxed)
    }

    /// Execute one full run. Waits for any run already in progress.
    pub async fn run_once(&self, trigger: Trigger) -> JobOutcome {
        let _guard = match self.guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::info!(%trigger, "Token job already running, waiting for it to finish");
                self.guard.lock().await
            }
        };

        let started = Instant::now();
        tracing::info!(%trigger, "Token job started");

        let outcome = match self.execute().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(%trigger, stage = e.stage(), error = %e, "Token job failed");
                JobOutcome::Failed {
                    stage: e.stage(),
                    error: e.to_string(),
                }
            }
        };

        self.completed_runs.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            %trigger,
            outcome = outcome.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Token job finished"
        );
        outcome
    }

    async fn execute(&self) -> Result<JobOutcome, JobError> {
        // Fetching
        let accounts = self.accounts.load().await.map_err(JobError::LoadAccounts)?;
        let batch = self.coordinator.fetch_all(&accounts).await;

        // Comparing
        let result_set = canonicalize(batch.tokens);
        let tokens = result_set.len();
        let commit = self
            .writer
            .commit_if_changed(&result_set)
            .await
            .map_err(JobError::Persist)?;

        match commit {
            CommitOutcome::Unchanged => Ok(JobOutcome::Unchanged { tokens }),
            CommitOutcome::Changed => {
                let published = self.publish().await;
                Ok(JobOutcome::Changed { tokens, published })
            }
        }
    }

    /// Push the persisted file. Failures are logged and not retried.
    async fn publish(&self) -> bool {
        let content = match self.writer.read_bytes().await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read token file for upload");
                return false;
            }
        };

        match self.publisher.publish(&self.publish_path, &content).await {
            Ok(outcome) => {
                tracing::info!(path = %self.publish_path, outcome = ?outcome, "Token file uploaded");
                true
            }
            Err(e) => {
                tracing::error!(path = %self.publish_path, error = %e, "Token file upload failed");
                false
            }
        }
    }
}
