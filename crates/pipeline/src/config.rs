use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tokensync_core::constants::{
    DEFAULT_ACCOUNTS_FILE, DEFAULT_TOKENS_FILE, DEFAULT_TOKEN_API_URL, FETCH_TIMEOUT_SECS,
    JOB_INTERVAL_SECS, MAX_CONCURRENCY, MAX_RETRIES, RETRY_DELAY_SECS,
};

/// Job configuration loaded from environment variables.
///
/// Every field has a default suitable for the hourly production job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Token API base URL.
    pub token_api_url: String,
    /// Path of the credentials file read on every run.
    pub accounts_file: PathBuf,
    /// Path of the persisted token file.
    pub tokens_file: PathBuf,
    /// Path of the published file inside the remote repository.
    pub publish_path: String,
    /// Maximum number of token requests in flight.
    pub max_concurrency: usize,
    /// Attempts per account.
    pub max_retries: u32,
    /// Per-attempt HTTP timeout.
    pub fetch_timeout: Duration,
    /// Pause between attempts for the same account.
    pub retry_delay: Duration,
    /// Period of the recurring job.
    pub job_interval: Duration,
    /// Whether to run once as soon as the process starts.
    pub run_on_startup: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            token_api_url: DEFAULT_TOKEN_API_URL.to_string(),
            accounts_file: PathBuf::from(DEFAULT_ACCOUNTS_FILE),
            tokens_file: PathBuf::from(DEFAULT_TOKENS_FILE),
            publish_path: DEFAULT_TOKENS_FILE.to_string(),
            max_concurrency: MAX_CONCURRENCY,
            max_retries: MAX_RETRIES,
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            retry_delay: Duration::from_secs(RETRY_DELAY_SECS),
            job_interval: Duration::from_secs(JOB_INTERVAL_SECS),
            run_on_startup: true,
        }
    }
}

impl JobConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                                 |
    /// |----------------------|-----------------------------------------|
    /// | `TOKEN_API_URL`      | `https://uditashu-jwt.vercel.app/token` |
    /// | `ACCOUNTS_FILE`      | `ind_ind.json`                          |
    /// | `TOKENS_FILE`        | `token_ind.json`                        |
    /// | `GITHUB_FILE_PATH`   | `token_ind.json`                        |
    /// | `MAX_CONCURRENCY`    | `50`                                    |
    /// | `MAX_RETRIES`        | `3`                                     |
    /// | `FETCH_TIMEOUT_SECS` | `5`                                     |
    /// | `RETRY_DELAY_SECS`   | `1`                                     |
    /// | `JOB_INTERVAL_SECS`  | `3600`                                  |
    /// | `RUN_ON_STARTUP`     | `true`                                  |
    ///
    /// Values that fail to parse fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            token_api_url: env_string("TOKEN_API_URL").unwrap_or(defaults.token_api_url),
            accounts_file: env_string("ACCOUNTS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.accounts_file),
            tokens_file: env_string("TOKENS_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.tokens_file),
            publish_path: env_string("GITHUB_FILE_PATH").unwrap_or(defaults.publish_path),
            max_concurrency: env_parse("MAX_CONCURRENCY", defaults.max_concurrency),
            max_retries: env_parse("MAX_RETRIES", defaults.max_retries),
            fetch_timeout: Duration::from_secs(env_parse("FETCH_TIMEOUT_SECS", FETCH_TIMEOUT_SECS)),
            retry_delay: Duration::from_secs(env_parse("RETRY_DELAY_SECS", RETRY_DELAY_SECS)),
            job_interval: Duration::from_secs(
                env_parse("JOB_INTERVAL_SECS", JOB_INTERVAL_SECS).max(1),
            ),
            run_on_startup: env_parse("RUN_ON_STARTUP", defaults.run_on_startup),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr + Copy + std::fmt::Debug>(key: &str, default: T) -> T {
    match env_string(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, default = ?default, "Invalid value, using default");
            default
        }),
        None => default,
    }
}
