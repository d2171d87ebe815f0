//! On-demand trigger for the token job.

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use tokensync_pipeline::Trigger;

use crate::state::AppState;

/// Acknowledgement returned by `/run-job` whatever the run's outcome.
pub const RUN_JOB_MESSAGE: &str = "JWT tokens updated!";

#[derive(Serialize)]
pub struct RunJobResponse {
    pub message: &'static str,
    /// `changed`, `unchanged` or `failed`.
    pub outcome: &'static str,
}

/// GET /run-job -- runs one full cycle and waits for it.
///
/// The run is spawned onto its own task, so a request that times out or
/// disconnects does not cut it short between the local write and the
/// upload. Always 200: batch-level failures are logged by the runner and
/// reported only through `outcome`.
async fn run_job(State(state): State<AppState>) -> Json<RunJobResponse> {
    let runner = Arc::clone(&state.runner);
    let handle = tokio::spawn(async move { runner.run_once(Trigger::OnDemand).await });

    let outcome = match handle.await {
        Ok(outcome) => outcome.label(),
        Err(e) => {
            tracing::error!(error = %e, "On-demand token job task failed");
            "failed"
        }
    };

    Json(RunJobResponse {
        message: RUN_JOB_MESSAGE,
        outcome,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/run-job", get(run_job))
}
