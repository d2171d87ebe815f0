//! In-memory collaborators for job runner tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokensync_core::Account;
use tokensync_fetcher::{AttemptError, FetchCoordinator, RetryPolicy, TokenFetcher, TokenSource};
use tokensync_pipeline::JobRunner;
use tokensync_publisher::{PublishError, PublishOutcome, Publisher};
use tokensync_store::{AccountSource, ChangeGatedWriter, StoreError};

pub const TOKENS_FILE: &str = "token_ind.json";

// ---------------------------------------------------------------------------
// Account sources
// ---------------------------------------------------------------------------

pub struct StaticAccounts(pub Vec<Account>);

#[async_trait]
impl AccountSource for StaticAccounts {
    async fn load(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.0.clone())
    }
}

pub struct BrokenAccounts;

#[async_trait]
impl AccountSource for BrokenAccounts {
    async fn load(&self) -> Result<Vec<Account>, StoreError> {
        Err(StoreError::Io {
            path: "ind_ind.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        })
    }
}

// ---------------------------------------------------------------------------
// Token source
// ---------------------------------------------------------------------------

/// uid → token; uids not in the map always get HTTP 500.
pub struct MapTokens {
    tokens: HashMap<String, String>,
    hold: Duration,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
}

impl MapTokens {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Self::with_hold(pairs, Duration::ZERO)
    }

    pub fn with_hold(pairs: &[(&str, &str)], hold: Duration) -> Arc<Self> {
        Arc::new(Self {
            tokens: pairs
                .iter()
                .map(|(u, t)| (u.to_string(), t.to_string()))
                .collect(),
            hold,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TokenSource for MapTokens {
    async fn request_token(&self, account: &Account) -> Result<String, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.hold).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.tokens
            .get(&account.uid)
            .cloned()
            .ok_or(AttemptError::HttpStatus(500))
    }
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingPublisher {
    pub calls: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, path: &str, content: &[u8]) -> Result<PublishOutcome, PublishError> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), content.to_vec()));
        if self.fail {
            return Err(PublishError::Unauthorized(401));
        }
        Ok(PublishOutcome::Updated)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub fn build_runner(
    dir: &Path,
    accounts: Arc<dyn AccountSource>,
    tokens: Arc<dyn TokenSource>,
    publisher: Arc<dyn Publisher>,
) -> JobRunner {
    let fetcher = TokenFetcher::new(tokens, RetryPolicy::new(3, Duration::ZERO));
    JobRunner::new(
        accounts,
        FetchCoordinator::new(fetcher, 50),
        ChangeGatedWriter::new(dir.join(TOKENS_FILE)),
        publisher,
        TOKENS_FILE,
    )
}

pub fn read_tokens(dir: &Path) -> serde_json::Value {
    let raw = std::fs::read_to_string(dir.join(TOKENS_FILE)).unwrap();
    serde_json::from_str(&raw).unwrap()
}
