//! Default tuning values for the fetch pipeline and job schedule.
//!
//! Each value can be overridden through the environment; see the config
//! loaders in `tokensync-pipeline` and `tokensync-api`.

/// Base URL of the remote token API. `uid` and `password` are appended as
/// query parameters.
pub const DEFAULT_TOKEN_API_URL: &str = "https://uditashu-jwt.vercel.app/token";

/// Maximum number of attempts per account before giving up.
pub const MAX_RETRIES: u32 = 3;

/// Per-attempt HTTP timeout in seconds.
pub const FETCH_TIMEOUT_SECS: u64 = 5;

/// Fixed delay between attempts for the same account, in seconds.
pub const RETRY_DELAY_SECS: u64 = 1;

/// Maximum number of fetches in flight at once.
pub const MAX_CONCURRENCY: usize = 50;

/// Interval of the recurring job, in seconds (1 hour).
pub const JOB_INTERVAL_SECS: u64 = 3600;

/// Default path of the account credentials file.
pub const DEFAULT_ACCOUNTS_FILE: &str = "ind_ind.json";

/// Default path of the persisted token file. Also used as the path of the
/// published file inside the remote repository.
pub const DEFAULT_TOKENS_FILE: &str = "token_ind.json";
