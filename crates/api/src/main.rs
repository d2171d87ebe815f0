use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokensync_pipeline::{scheduler, JobConfig, JobRunner, Trigger};
use tokensync_publisher::{GithubConfig, GithubPublisher};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokensync_api::config::ServerConfig;
use tokensync_api::router::build_app_router;
use tokensync_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let job_config = JobConfig::from_env();
    tracing::info!(
        accounts_file = %job_config.accounts_file.display(),
        tokens_file = %job_config.tokens_file.display(),
        max_concurrency = job_config.max_concurrency,
        interval_secs = job_config.job_interval.as_secs(),
        "Loaded job configuration"
    );

    // --- Publisher ---
    let github = GithubConfig::from_env();
    let missing = github.missing();
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            "GitHub publishing is not configured, uploads will fail"
        );
    }
    let publisher = GithubPublisher::new(github).context("Failed to build GitHub client")?;

    // --- Job runner ---
    let runner = Arc::new(
        JobRunner::from_config(&job_config, Arc::new(publisher))
            .context("Failed to build token job")?,
    );

    let cancel = CancellationToken::new();

    // Startup run, independent of the scheduler's first tick.
    let startup_handle = job_config.run_on_startup.then(|| {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            runner.run_once(Trigger::Startup).await;
        })
    });

    // Recurring run.
    let scheduler_handle = tokio::spawn(scheduler::run(
        Arc::clone(&runner),
        job_config.job_interval,
        cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        runner,
    };

    // --- Router ---
    let app = build_app_router(state, &config)?;

    // --- Start server ---
    let host: IpAddr = config
        .host
        .parse()
        .with_context(|| format!("Invalid HOST address '{}'", config.host))?;
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    cancel.cancel();
    if tokio::time::timeout(grace, scheduler_handle).await.is_err() {
        tracing::warn!("Scheduler did not stop within the shutdown timeout");
    } else {
        tracing::info!("Scheduler stopped");
    }

    if let Some(handle) = startup_handle {
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Startup run did not finish within the shutdown timeout");
        }
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Install the global subscriber. `LOG_FORMAT=json` switches to
/// line-delimited JSON output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "tokensync_api=info,tokensync_pipeline=info,tokensync_fetcher=info,\
         tokensync_store=info,tokensync_publisher=info,tower_http=info"
            .into()
    });
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
