//! Reqwest-backed GitLab API gateway.
//!
//! [`GitLabClient`] is a short-lived client constructed once per task or
//! request with an explicit token, so retry/timeout policy and token
//! refresh stay in the caller's hands rather than hiding behind cached
//! globals.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tagvault_core::types::DbId;

use crate::token::{TokenError, TokenStore};
use crate::types::{GlContributor, GlHook, GlProject, GlTag, HookAttrs};

/// HTTP request timeout for a single API call. Archive downloads are
/// streamed and only subject to this timeout until response headers
/// arrive.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default GitLab instance.
pub const DEFAULT_BASE_URL: &str = "https://gitlab.com";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for gateway failures.
#[derive(Debug, thiserror::Error)]
pub enum GitLabError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("GitLab request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The API returned a non-2xx status code.
    #[error("GitLab returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// No access token could be resolved for the user.
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// Streamed archive body.
pub type ArchiveStream = BoxStream<'static, Result<Bytes, GitLabError>>;

// ---------------------------------------------------------------------------
// Gateway contract
// ---------------------------------------------------------------------------

/// Remote platform operations the pipeline depends on.
#[async_trait]
pub trait GitLabGateway: Send + Sync {
    /// Fetch a project by its remote id.
    async fn project(&self, project_id: i64) -> Result<GlProject, GitLabError>;

    /// Fetch a tag with its commit metadata.
    async fn tag(&self, project_id: i64, tag: &str) -> Result<GlTag, GitLabError>;

    /// List project contributors.
    async fn contributors(&self, project_id: i64) -> Result<Vec<GlContributor>, GitLabError>;

    /// Stream the source archive for an exact commit SHA.
    async fn archive(&self, project_id: i64, sha: &str) -> Result<ArchiveStream, GitLabError>;

    /// Install a webhook, returning its remote id. Any pre-existing hook
    /// pointing at the same URL is removed first so the install is
    /// idempotent.
    async fn install_hook(&self, project_id: i64, attrs: &HookAttrs) -> Result<i64, GitLabError>;

    /// Remove a webhook by id.
    async fn remove_hook(&self, project_id: i64, hook_id: i64) -> Result<(), GitLabError>;
}

// ---------------------------------------------------------------------------
// Reqwest implementation
// ---------------------------------------------------------------------------

/// Connection parameters for a GitLab instance.
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Instance base URL, e.g. `https://gitlab.com`.
    pub base_url: String,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Authenticated client for one GitLab instance and one user token.
pub struct GitLabClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl GitLabClient {
    /// Create a client for the given instance and access token.
    pub fn new(config: &GitLabConfig, token: impl Into<String>) -> Result<Self, GitLabError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v4/{path}", self.base_url)
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, GitLabError> {
        let url = self.url(path);
        let response = self.http.get(&url).bearer_auth(&self.token).send().await?;
        check_status(response, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitLabError> {
        Ok(self.get(path).await?.json().await?)
    }
}

/// Percent-encode the characters that would break a tag name used as a
/// path segment.
fn encode_segment(raw: &str) -> String {
    raw.replace('%', "%25")
        .replace('/', "%2F")
        .replace('?', "%3F")
        .replace('#', "%23")
}

fn check_status(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<reqwest::Response, GitLabError> {
    let status = response.status();
    if !status.is_success() {
        return Err(GitLabError::Status {
            status: status.as_u16(),
            endpoint: endpoint.to_string(),
        });
    }
    Ok(response)
}

#[async_trait]
impl GitLabGateway for GitLabClient {
    async fn project(&self, project_id: i64) -> Result<GlProject, GitLabError> {
        self.get_json(&format!("projects/{project_id}")).await
    }

    async fn tag(&self, project_id: i64, tag: &str) -> Result<GlTag, GitLabError> {
        self.get_json(&format!(
            "projects/{project_id}/repository/tags/{}",
            encode_segment(tag)
        ))
        .await
    }

    async fn contributors(&self, project_id: i64) -> Result<Vec<GlContributor>, GitLabError> {
        self.get_json(&format!("projects/{project_id}/repository/contributors"))
            .await
    }

    async fn archive(&self, project_id: i64, sha: &str) -> Result<ArchiveStream, GitLabError> {
        let response = self
            .get(&format!(
                "projects/{project_id}/repository/archive.tar.gz?sha={sha}"
            ))
            .await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(GitLabError::from))
            .boxed())
    }

    async fn install_hook(&self, project_id: i64, attrs: &HookAttrs) -> Result<i64, GitLabError> {
        // Drop any hook already pointing at our receiver URL, then
        // recreate it so the stored attributes are current.
        let existing: Vec<GlHook> = self.get_json(&format!("projects/{project_id}/hooks")).await?;
        for hook in existing.iter().filter(|h| h.url == attrs.url) {
            self.remove_hook(project_id, hook.id).await?;
        }

        let path = format!("projects/{project_id}/hooks");
        let response = self
            .http
            .post(self.url(&path))
            .bearer_auth(&self.token)
            .json(attrs)
            .send()
            .await?;
        let hook: GlHook = check_status(response, &path)?.json().await?;

        tracing::info!(project_id, hook_id = hook.id, "Installed GitLab webhook");
        Ok(hook.id)
    }

    async fn remove_hook(&self, project_id: i64, hook_id: i64) -> Result<(), GitLabError> {
        let path = format!("projects/{project_id}/hooks/{hook_id}");
        let response = self
            .http
            .delete(self.url(&path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        check_status(response, &path)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Gateway factory
// ---------------------------------------------------------------------------

/// Builds a gateway authenticated as a specific user.
///
/// The processing worker receives a factory rather than a client so each
/// task constructs its own short-lived gateway with a fresh token.
#[async_trait]
pub trait GatewayFactory: Send + Sync {
    type Gateway: GitLabGateway;

    async fn for_user(&self, user_id: DbId) -> Result<Self::Gateway, GitLabError>;
}

/// Factory resolving tokens through a [`TokenStore`].
pub struct TokenGatewayFactory<S> {
    config: GitLabConfig,
    store: S,
}

impl<S: TokenStore> TokenGatewayFactory<S> {
    pub fn new(config: GitLabConfig, store: S) -> Self {
        Self { config, store }
    }
}

#[async_trait]
impl<S: TokenStore> GatewayFactory for TokenGatewayFactory<S> {
    type Gateway = GitLabClient;

    async fn for_user(&self, user_id: DbId) -> Result<GitLabClient, GitLabError> {
        let token = self.store.access_token(user_id).await?;
        GitLabClient::new(&self.config, token)
    }
}
