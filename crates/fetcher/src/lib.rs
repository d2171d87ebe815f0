//! Token fetching: one remote call per attempt, a bounded retry loop per
//! account, and a bounded fan-out over a whole credential batch.
//!
//! - [`TokenSource`] performs a single attempt; [`TokenApiClient`] is the
//!   reqwest-backed implementation.
//! - [`TokenFetcher`] wraps a source with a [`RetryPolicy`].
//! - [`FetchCoordinator`] runs a fetcher over a batch with a concurrency cap.

pub mod client;
pub mod coordinator;
pub mod error;
pub mod fetcher;

pub use client::{TokenApiClient, TokenSource};
pub use coordinator::{BatchOutcome, FetchCoordinator};
pub use error::{AttemptError, FetchFailure};
pub use fetcher::{RetryPolicy, TokenFetcher};
