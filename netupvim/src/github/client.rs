//! Blocking client for the GitHub releases API.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::ACCEPT;
use tracing::{debug, info};

use super::types::Release;
use super::ReleasesApi;
use crate::download::DEFAULT_TIMEOUT_SECS;
use crate::error::{UpdateError, UpdateResult};
use crate::USER_AGENT;

/// Public GitHub API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Media type GitHub recommends for REST v3 requests.
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";

/// Optional credentials for the releases API.
///
/// Unauthenticated requests work but share a small rate limit per address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubCredentials {
    /// Account name; with a token this selects basic auth.
    pub user: Option<String>,
    /// Personal access token.
    pub token: String,
}

impl GithubCredentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.user {
            Some(user) => request.basic_auth(user, Some(&self.token)),
            None => request.bearer_auth(&self.token),
        }
    }
}

/// Releases API client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
    credentials: Option<GithubCredentials>,
    verbose: bool,
    timeout: Duration,
}

impl GithubClient {
    /// Create a client for the public API with the default timeout.
    pub fn new() -> UpdateResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a client for the public API with a custom timeout.
    pub fn with_timeout(timeout: Duration) -> UpdateResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(UpdateError::ClientBuild)?;

        Ok(Self {
            client,
            base_url: DEFAULT_API_BASE.to_string(),
            credentials: None,
            verbose: false,
            timeout,
        })
    }

    /// Point the client at another API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate requests.
    pub fn with_credentials(mut self, credentials: Option<GithubCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Log every API request and the remaining rate limit.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn latest_release_url(&self, owner: &str, project: &str) -> String {
        format!("{}/repos/{}/{}/releases/latest", self.base_url, owner, project)
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> UpdateError {
        if e.is_timeout() {
            UpdateError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            UpdateError::Http {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

impl ReleasesApi for GithubClient {
    fn latest_release(&self, owner: &str, project: &str) -> UpdateResult<Release> {
        let url = self.latest_release_url(owner, project);

        let mut request = self.client.get(&url).header(ACCEPT, GITHUB_MEDIA_TYPE);
        if let Some(credentials) = &self.credentials {
            request = credentials.apply(request);
        }

        if self.verbose {
            info!(url = %url, authenticated = self.credentials.is_some(), "github API request");
        }
        let response = request.send().map_err(|e| self.request_error(&url, e))?;

        let status = response.status();
        if self.verbose {
            let remaining = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("?");
            info!(url = %url, %status, rate_limit_remaining = remaining, "github API response");
        }

        if !status.is_success() {
            return Err(UpdateError::UnexpectedResponse {
                url,
                status: status.to_string(),
            });
        }

        let body = response.text().map_err(|e| self.request_error(&url, e))?;
        let release: Release =
            serde_json::from_str(&body).map_err(|e| UpdateError::ReleaseParseFailed {
                url: url.clone(),
                source: e,
            })?;

        debug!(
            owner,
            project,
            tag = %release.tag_name,
            assets = release.assets.len(),
            "latest release fetched"
        );
        Ok(release)
    }
}
