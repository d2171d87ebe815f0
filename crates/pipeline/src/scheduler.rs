//! Recurring trigger for the token job.
//!
//! Spawned once at startup via `tokio::spawn` and stopped through its
//! [`CancellationToken`] at shutdown. The first tick fires one full period
//! after start; the startup run is handled separately by the binary.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::job::{JobRunner, Trigger};

/// Run the job every `period` until `cancel` is triggered.
///
/// A run in progress is allowed to finish; cancellation is observed between
/// runs.
pub async fn run(runner: Arc<JobRunner>, period: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = period.as_secs(), "Token job scheduler started");

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token job scheduler stopping");
                break;
            }
            _ = interval.tick() => {
                runner.run_once(Trigger::Schedule).await;
            }
        }
    }
}
