//! GitHub contents API publisher.
//!
//! `GET /repos/{owner}/{repo}/contents/{path}` finds the current blob sha;
//! `PUT` on the same URL creates the file (no sha) or updates it (with sha).
//! Without a configured owner, the repository belongs to the token's own
//! account (`GET /user`).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::PublishError;
use crate::{PublishOutcome, Publisher};

/// Default GitHub REST API root.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Commit message used when the file is first created.
const CREATE_MESSAGE: &str = "Added JWT tokens";

/// Commit message used when an existing file is replaced.
const UPDATE_MESSAGE: &str = "Updated JWT tokens";

/// HTTP timeout for a single GitHub API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Repository identity and credential.
///
/// Fields are optional so a missing setting fails the publish stage instead
/// of process startup.
#[derive(Clone, Default)]
pub struct GithubConfig {
    /// API root (default: `https://api.github.com`).
    pub api_url: String,
    /// Repository owner (`GITHUB_USERNAME`); the authenticated user when unset.
    pub owner: Option<String>,
    /// Repository name (`GITHUB_REPO`).
    pub repo: Option<String>,
    /// Personal access token (`GITHUB_TOKEN`).
    pub token: Option<String>,
    /// Target branch; the repository default branch when unset.
    pub branch: Option<String>,
}

impl GithubConfig {
    /// Load from the environment.
    ///
    /// | Env Var           | Default                  |
    /// |-------------------|--------------------------|
    /// | `GITHUB_API_URL`  | `https://api.github.com` |
    /// | `GITHUB_USERNAME` | token's own login        |
    /// | `GITHUB_REPO`     | unset                    |
    /// | `GITHUB_TOKEN`    | unset                    |
    /// | `GITHUB_BRANCH`   | unset                    |
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        Self {
            api_url: non_empty("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            owner: non_empty("GITHUB_USERNAME"),
            repo: non_empty("GITHUB_REPO"),
            token: non_empty("GITHUB_TOKEN"),
            branch: non_empty("GITHUB_BRANCH"),
        }
    }

    /// Names of the required variables that are not set.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.repo.is_none() {
            missing.push("GITHUB_REPO");
        }
        if self.token.is_none() {
            missing.push("GITHUB_TOKEN");
        }
        missing
    }
}

impl fmt::Debug for GithubConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("api_url", &self.api_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("branch", &self.branch)
            .finish()
    }
}

/// Resolved settings once all required values are present.
struct Target<'a> {
    owner: String,
    repo: &'a str,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// [`Publisher`] backed by the GitHub contents API.
pub struct GithubPublisher {
    client: reqwest::Client,
    config: GithubConfig,
}

impl GithubPublisher {
    pub fn new(config: GithubConfig) -> Result<Self, PublishError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("tokensync/", env!("CARGO_PKG_VERSION"))),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &GithubConfig {
        &self.config
    }

    async fn target(&self) -> Result<Target<'_>, PublishError> {
        let (Some(repo), Some(token)) = (&self.config.repo, &self.config.token) else {
            return Err(PublishError::NotConfigured(self.config.missing().join(", ")));
        };

        let owner = match &self.config.owner {
            Some(owner) => owner.clone(),
            None => self.authenticated_login(token).await?,
        };

        Ok(Target {
            owner,
            repo: repo.as_str(),
            token: token.as_str(),
        })
    }

    /// Login of the account `token` belongs to.
    async fn authenticated_login(&self, token: &str) -> Result<String, PublishError> {
        let url = format!("{}/user", self.config.api_url.trim_end_matches('/'));
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        let user: UserResponse = response
            .json()
            .await
            .map_err(|e| PublishError::MalformedResponse(e.to_string()))?;
        tracing::debug!(login = %user.login, "Resolved repository owner from token");
        Ok(user.login)
    }

    fn contents_url(&self, target: &Target<'_>, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.config.api_url.trim_end_matches('/'),
            target.owner,
            target.repo,
            path.trim_start_matches('/'),
        )
    }

    /// Blob sha of the file at `url`, or `None` if it does not exist yet.
    async fn current_sha(&self, url: &str, token: &str) -> Result<Option<String>, PublishError> {
        let mut request = self.client.get(url).bearer_auth(token);
        if let Some(branch) = &self.config.branch {
            request = request.query(&[("ref", branch.as_str())]);
        }
        let response = request.send().await?;

        match response.status() {
            StatusCode::OK => {
                let body: ContentsResponse = response
                    .json()
                    .await
                    .map_err(|e| PublishError::MalformedResponse(e.to_string()))?;
                Ok(Some(body.sha))
            }
            StatusCode::NOT_FOUND => Ok(None),
            status => Err(status_error(status, response).await),
        }
    }
}

#[async_trait]
impl Publisher for GithubPublisher {
    async fn publish(&self, path: &str, content: &[u8]) -> Result<PublishOutcome, PublishError> {
        let target = self.target().await?;
        let url = self.contents_url(&target, path);

        let sha = self.current_sha(&url, target.token).await?;
        let (message, outcome) = match sha {
            Some(_) => (UPDATE_MESSAGE, PublishOutcome::Updated),
            None => (CREATE_MESSAGE, PublishOutcome::Created),
        };

        let body = PutContentsRequest {
            message,
            content: base64::engine::general_purpose::STANDARD.encode(content),
            sha: sha.as_deref(),
            branch: self.config.branch.as_deref(),
        };

        let response = self
            .client
            .put(&url)
            .bearer_auth(target.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status, response).await);
        }

        tracing::info!(
            owner = %target.owner,
            repo = target.repo,
            path,
            outcome = ?outcome,
            "Published token file"
        );
        Ok(outcome)
    }
}

async fn status_error(status: StatusCode, response: reqwest::Response) -> PublishError {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return PublishError::Unauthorized(status.as_u16());
    }
    let body = response.text().await.unwrap_or_default();
    PublishError::HttpStatus {
        status: status.as_u16(),
        body,
    }
}
