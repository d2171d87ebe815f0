//! Bounded fan-out of a credential batch over a [`TokenFetcher`].
//!
//! Every account gets its own task in a [`JoinSet`]; a [`Semaphore`] caps
//! how many token requests are in flight at once. The set is created and
//! fully drained inside [`FetchCoordinator::fetch_all`], so no task outlives
//! the call.

use std::sync::Arc;

use tokensync_core::constants::MAX_CONCURRENCY;
use tokensync_core::{Account, FetchedToken};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::FetchFailure;
use crate::fetcher::TokenFetcher;

/// Successful tokens of one batch plus its tallies.
///
/// `tokens` is in completion order.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub tokens: Vec<FetchedToken>,
    pub requested: usize,
    pub failed: usize,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> usize {
        self.tokens.len()
    }
}

/// Runs a [`TokenFetcher`] over a batch with a fixed concurrency cap.
#[derive(Clone)]
pub struct FetchCoordinator {
    fetcher: TokenFetcher,
    max_concurrency: usize,
}

impl FetchCoordinator {
    /// `max_concurrency` is clamped to at least 1.
    pub fn new(fetcher: TokenFetcher, max_concurrency: usize) -> Self {
        Self {
            fetcher,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn with_default_concurrency(fetcher: TokenFetcher) -> Self {
        Self::new(fetcher, MAX_CONCURRENCY)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Fetch a token for every account in `batch`.
    ///
    /// Failed accounts are left out of the result; partial results are the
    /// normal outcome. A panicking fetch task counts as a failure.
    pub async fn fetch_all(&self, batch: &[Account]) -> BatchOutcome {
        tracing::info!(
            accounts = batch.len(),
            max_concurrency = self.max_concurrency,
            "Fetching tokens"
        );

        let gate = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<Result<FetchedToken, FetchFailure>> = JoinSet::new();

        for account in batch.iter().cloned() {
            let fetcher = self.fetcher.clone();
            let gate = Arc::clone(&gate);
            tasks.spawn(async move {
                fetcher
                    .fetch_with_gate(&account, Some(gate.as_ref()))
                    .await
            });
        }

        let mut outcome = BatchOutcome {
            tokens: Vec::with_capacity(batch.len()),
            requested: batch.len(),
            failed: 0,
        };

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(token)) => outcome.tokens.push(token),
                // Already logged by the fetcher.
                Ok(Err(_failure)) => outcome.failed += 1,
                Err(e) => {
                    tracing::error!(error = %e, "Token fetch task aborted");
                    outcome.failed += 1;
                }
            }
        }

        tracing::info!(
            requested = outcome.requested,
            succeeded = outcome.succeeded(),
            failed = outcome.failed,
            "Token batch complete"
        );

        outcome
    }
}
