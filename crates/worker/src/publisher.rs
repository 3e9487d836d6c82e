//! Record-publishing contract and its REST implementation.
//!
//! Publishing is a three-step conversation with the archival
//! repository: create a draft deposit from metadata, attach the source
//! archive, publish. The [`RecordPublisher`] and [`Deposit`] traits
//! keep the repository swappable; [`RestPublisher`] talks to a
//! deposit-style REST API.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tagvault_core::metadata::RecordMetadata;
use tagvault_core::types::DbId;
use tagvault_gitlab::ArchiveStream;
use uuid::Uuid;

/// HTTP request timeout for metadata calls. File uploads are streamed
/// and only subject to this timeout until response headers arrive.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

/// Error type for publishing failures.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The underlying HTTP request failed.
    #[error("Publisher request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The repository rejected a call with a non-2xx status.
    #[error("Publisher returned HTTP {status}: {detail}")]
    Status { status: u16, detail: String },
}

/// The published, citable artifact.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishedRecord {
    pub record_id: Uuid,
}

/// A draft deposit that can receive files and be published.
#[async_trait]
pub trait Deposit: Send {
    /// Attach a file under the given name, streaming its content.
    async fn attach_file(&mut self, name: &str, content: ArchiveStream)
        -> Result<(), PublishError>;

    /// Publish the deposit, producing the final record.
    async fn publish(self: Box<Self>) -> Result<PublishedRecord, PublishError>;
}

/// Creates draft deposits on behalf of a user.
#[async_trait]
pub trait RecordPublisher: Send + Sync {
    async fn create_draft(
        &self,
        owner_id: DbId,
        metadata: &RecordMetadata,
    ) -> Result<Box<dyn Deposit>, PublishError>;
}

// ---------------------------------------------------------------------------
// REST implementation
// ---------------------------------------------------------------------------

/// Connection parameters for the archival repository's deposit API.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Repository base URL, e.g. `https://archive.example.org`.
    pub base_url: String,
    /// Bearer token authorizing deposit calls.
    pub token: String,
}

/// Publisher backed by a deposit-style REST API.
pub struct RestPublisher {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    id: Uuid,
}

impl RestPublisher {
    pub fn new(config: &PublisherConfig) -> Result<Self, PublishError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            http,
        })
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PublishError> {
    let status = response.status();
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(PublishError::Status {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(response)
}

#[async_trait]
impl RecordPublisher for RestPublisher {
    async fn create_draft(
        &self,
        owner_id: DbId,
        metadata: &RecordMetadata,
    ) -> Result<Box<dyn Deposit>, PublishError> {
        let response = self
            .http
            .post(format!("{}/api/deposits", self.base_url))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "metadata": metadata,
                "created_by": owner_id,
                "owners": [owner_id],
            }))
            .send()
            .await?;
        let draft: DraftResponse = check_status(response).await?.json().await?;

        Ok(Box::new(RestDeposit {
            url: format!("{}/api/deposits/{}", self.base_url, draft.id),
            token: self.token.clone(),
            http: self.http.clone(),
        }))
    }
}

/// A draft deposit held on the remote repository.
struct RestDeposit {
    url: String,
    token: String,
    http: reqwest::Client,
}

#[async_trait]
impl Deposit for RestDeposit {
    async fn attach_file(
        &mut self,
        name: &str,
        content: ArchiveStream,
    ) -> Result<(), PublishError> {
        let response = self
            .http
            .put(format!("{}/files/{name}", self.url))
            .bearer_auth(&self.token)
            .body(reqwest::Body::wrap_stream(content))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn publish(self: Box<Self>) -> Result<PublishedRecord, PublishError> {
        let response = self
            .http
            .post(format!("{}/actions/publish", self.url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check_status(response).await?.json().await?)
    }
}
