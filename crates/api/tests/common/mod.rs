//! Router fixtures backed by in-memory job collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokensync_api::config::ServerConfig;
use tokensync_api::router::build_app_router;
use tokensync_api::state::AppState;
use tokensync_core::Account;
use tokensync_fetcher::{AttemptError, FetchCoordinator, RetryPolicy, TokenFetcher, TokenSource};
use tokensync_pipeline::JobRunner;
use tokensync_publisher::{PublishError, PublishOutcome, Publisher};
use tokensync_store::{AccountSource, ChangeGatedWriter, StoreError};
use tower::ServiceExt;

pub const TOKENS_FILE: &str = "token_ind.json";
pub const TEST_ORIGIN: &str = "http://localhost:5000";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![TEST_ORIGIN.to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

pub struct StaticAccounts(pub Vec<Account>);

#[async_trait]
impl AccountSource for StaticAccounts {
    async fn load(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.0.clone())
    }
}

pub struct MissingAccounts;

#[async_trait]
impl AccountSource for MissingAccounts {
    async fn load(&self) -> Result<Vec<Account>, StoreError> {
        Err(StoreError::Io {
            path: "ind_ind.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        })
    }
}

/// uid → token; other uids get HTTP 500.
pub struct MapTokens {
    tokens: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl MapTokens {
    pub fn new(pairs: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            tokens: pairs
                .iter()
                .map(|(u, t)| (u.to_string(), t.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TokenSource for MapTokens {
    async fn request_token(&self, account: &Account) -> Result<String, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens
            .get(&account.uid)
            .cloned()
            .ok_or(AttemptError::HttpStatus(500))
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub calls: Mutex<Vec<Vec<u8>>>,
}

impl RecordingPublisher {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// Publisher that takes `delay` before recording a successful upload.
pub struct SlowPublisher {
    delay: Duration,
    pub completed: AtomicUsize,
}

impl SlowPublisher {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            completed: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Publisher for SlowPublisher {
    async fn publish(&self, _path: &str, _content: &[u8]) -> Result<PublishOutcome, PublishError> {
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(PublishOutcome::Created)
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, _path: &str, content: &[u8]) -> Result<PublishOutcome, PublishError> {
        self.calls.lock().unwrap().push(content.to_vec());
        Ok(PublishOutcome::Updated)
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub fn build_runner(
    dir: &Path,
    accounts: Arc<dyn AccountSource>,
    tokens: Arc<dyn TokenSource>,
    publisher: Arc<dyn Publisher>,
) -> Arc<JobRunner> {
    let fetcher = TokenFetcher::new(tokens, RetryPolicy::new(3, Duration::ZERO));
    Arc::new(JobRunner::new(
        accounts,
        FetchCoordinator::new(fetcher, 50),
        ChangeGatedWriter::new(dir.join(TOKENS_FILE)),
        publisher,
        TOKENS_FILE,
    ))
}

/// Build the full application router with all middleware layers around the
/// given runner.
pub fn build_test_app(runner: Arc<JobRunner>) -> Router {
    build_test_app_with_config(runner, test_config())
}

pub fn build_test_app_with_config(runner: Arc<JobRunner>, config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        runner,
    };
    build_app_router(state, &config).unwrap()
}

/// Router whose job has no accounts configured.
pub fn idle_app(dir: &Path) -> Router {
    build_test_app(build_runner(
        dir,
        Arc::new(StaticAccounts(Vec::new())),
        MapTokens::new(&[]),
        Arc::new(RecordingPublisher::default()),
    ))
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
