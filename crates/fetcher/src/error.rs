//! Per-attempt and per-account failure types.

/// Why a single token request attempt failed. Every variant is retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    /// The request did not complete within the per-attempt timeout.
    #[error("Request timed out")]
    Timeout,

    /// The connection to the token API could not be established.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The token API answered with a status other than 200.
    #[error("Token API returned HTTP {0}")]
    HttpStatus(u16),

    /// HTTP 200, but the body had no `token` or an empty one.
    #[error("No token in response")]
    MissingToken,

    /// HTTP 200, but the body was not the expected JSON.
    #[error("Malformed response body: {0}")]
    MalformedBody(String),

    /// Any other request failure (URL building, body read, redirect loop).
    #[error("Request failed: {0}")]
    Request(String),
}

impl AttemptError {
    /// Short label used as the `outcome` field in attempt logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptError::Timeout => "timeout",
            AttemptError::Connection(_) => "connection_error",
            AttemptError::HttpStatus(_) => "http_status",
            AttemptError::MissingToken => "missing_token",
            AttemptError::MalformedBody(_) => "malformed_body",
            AttemptError::Request(_) => "request_error",
        }
    }
}

impl From<reqwest::Error> for AttemptError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AttemptError::Timeout
        } else if err.is_connect() {
            AttemptError::Connection(err.to_string())
        } else {
            AttemptError::Request(err.to_string())
        }
    }
}

/// Definitive failure for one account: every attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Giving up on uid {uid} after {attempts} attempts: {last_error}")]
pub struct FetchFailure {
    pub uid: String,
    pub attempts: u32,
    pub last_error: AttemptError,
}
