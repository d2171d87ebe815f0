use std::sync::Arc;

use tokensync_pipeline::JobRunner;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// The single token job instance shared with the scheduler.
    pub runner: Arc<JobRunner>,
}
