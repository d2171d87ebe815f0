/// Error type for publish failures. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// Required repository settings are missing from the environment.
    #[error("Publisher not configured: missing {0}")]
    NotConfigured(String),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote rejected the credential.
    #[error("Remote rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    /// Any other non-success status.
    #[error("Remote returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// A success response whose body could not be understood.
    #[error("Unexpected response body: {0}")]
    MalformedResponse(String),
}
