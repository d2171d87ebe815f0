//! Single-attempt access to the remote token API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tokensync_core::Account;

use crate::error::AttemptError;

/// Something that can produce a token for an account in one attempt.
///
/// Implementations must not retry; the retry loop lives in
/// [`TokenFetcher`](crate::fetcher::TokenFetcher).
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn request_token(&self, account: &Account) -> Result<String, AttemptError>;
}

/// Success body of the token API: `{"token": "<string>"}`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
}

/// reqwest-backed [`TokenSource`] for `GET <base>?uid=..&password=..`.
#[derive(Debug, Clone)]
pub struct TokenApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl TokenApiClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TokenSource for TokenApiClient {
    async fn request_token(&self, account: &Account) -> Result<String, AttemptError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("uid", account.uid.as_str()),
                ("password", account.password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AttemptError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| AttemptError::MalformedBody(e.to_string()))?;

        match parsed.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AttemptError::MissingToken),
        }
    }
}
