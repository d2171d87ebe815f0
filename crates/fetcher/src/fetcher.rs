//! Fixed-delay retry loop around a [`TokenSource`].
//!
//! Each account gets up to `max_attempts` strictly sequential attempts with
//! a constant pause between them. Every attempt is logged with the account
//! uid, the attempt number and its outcome.

use std::sync::Arc;
use std::time::Duration;

use tokensync_core::constants::{MAX_RETRIES, RETRY_DELAY_SECS};
use tokensync_core::{Account, FetchedToken};
use tokio::sync::Semaphore;

use crate::client::TokenSource;
use crate::error::FetchFailure;

/// Attempt cap and inter-attempt delay for one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least 1.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_RETRIES, Duration::from_secs(RETRY_DELAY_SECS))
    }
}

/// Fetches one token per account, retrying transient failures.
///
/// Cheap to clone: the source is shared behind an `Arc`.
#[derive(Clone)]
pub struct TokenFetcher {
    source: Arc<dyn TokenSource>,
    policy: RetryPolicy,
}

impl TokenFetcher {
    pub fn new(source: Arc<dyn TokenSource>, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch a token for `account`, retrying up to the policy's cap.
    pub async fn fetch(&self, account: &Account) -> Result<FetchedToken, FetchFailure> {
        self.fetch_with_gate(account, None).await
    }

    /// Like [`fetch`](Self::fetch), but every attempt first takes a permit
    /// from `gate`. The permit is released before the retry delay, so a
    /// sleeping account does not occupy an in-flight slot.
    pub(crate) async fn fetch_with_gate(
        &self,
        account: &Account,
        gate: Option<&Semaphore>,
    ) -> Result<FetchedToken, FetchFailure> {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 1;

        loop {
            let result = {
                // A closed gate only happens if the owner dropped it; run
                // ungated rather than fail the account.
                let _permit = match gate {
                    Some(gate) => gate.acquire().await.ok(),
                    None => None,
                };
                self.source.request_token(account).await
            };

            match result {
                Ok(token) => {
                    tracing::info!(
                        uid = %account.uid,
                        attempt,
                        outcome = "success",
                        "Fetched token"
                    );
                    return Ok(FetchedToken {
                        uid: account.uid.clone(),
                        token,
                    });
                }
                Err(e) if attempt >= max_attempts => {
                    tracing::warn!(
                        uid = %account.uid,
                        attempt,
                        outcome = e.kind(),
                        error = %e,
                        "Token attempt failed"
                    );
                    tracing::error!(
                        uid = %account.uid,
                        attempts = attempt,
                        "Skipping account after all attempts failed"
                    );
                    return Err(FetchFailure {
                        uid: account.uid.clone(),
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        uid = %account.uid,
                        attempt,
                        outcome = e.kind(),
                        error = %e,
                        "Token attempt failed, retrying"
                    );
                    tokio::time::sleep(self.policy.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
