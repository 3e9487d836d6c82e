//! Asynchronous release processing.
//!
//! Invoked with `(tag, project_id)` under at-least-once delivery. The
//! initial claim is the concurrency guard: a second invocation for the
//! same release finds no candidate and exits harmlessly. Once a release
//! is claimed, the status commit at the end is unconditional, so a
//! release never stays in PROCESSING because of a fetch or publish
//! failure.

use sqlx::PgPool;
use tagvault_core::error::CoreError;
use tagvault_core::metadata::{self, Creator, RecordMetadata};
use tagvault_core::payload::TagPushPayload;
use tagvault_core::types::DbId;
use tagvault_db::models::{HookEvent, Project, Release};
use tagvault_db::repositories::{EventRepo, ProjectRepo, ReleaseRepo};
use tagvault_gitlab::{GatewayFactory, GitLabError, GitLabGateway};

use crate::publisher::{PublishError, PublishedRecord, RecordPublisher};

/// Error type for faults that escape a processing run.
///
/// Fetch and publish failures do NOT escape: they are persisted on the
/// release as status FAILED plus an error payload. What escapes is the
/// infrastructure around that bookkeeping, and `InvalidSender`, which
/// is a dispatch-layer fault for the task framework to act on.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Sender verification failed; the release is left untouched in
    /// PROCESSING for operator attention.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error while claiming or recording status.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Everything that can go wrong between claim and status commit.
/// Converted into the release's `errors` payload, never propagated.
#[derive(Debug, thiserror::Error)]
enum ProcessFailure {
    #[error("{0}")]
    Payload(#[from] CoreError),

    #[error(transparent)]
    Remote(#[from] GitLabError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error("{0}")]
    Data(String),
}

/// Drives a release from RECEIVED/FAILED to PUBLISHED or FAILED.
///
/// Capabilities are injected at construction: a [`GatewayFactory`] so
/// each run builds its own short-lived, per-user GitLab client, and a
/// [`RecordPublisher`] for the archival repository.
pub struct ReleaseProcessor<F, P> {
    pool: PgPool,
    gateways: F,
    publisher: P,
}

impl<F, P> ReleaseProcessor<F, P>
where
    F: GatewayFactory,
    P: RecordPublisher,
{
    pub fn new(pool: PgPool, gateways: F, publisher: P) -> Self {
        Self {
            pool,
            gateways,
            publisher,
        }
    }

    /// Process one release identified by `(tag, project_id)`.
    ///
    /// A no-op when no release in a processable status matches, i.e.
    /// the release is already PROCESSING, PUBLISHED, or DELETED.
    pub async fn process(
        &self,
        tag: &str,
        project_id: DbId,
        verify_sender: bool,
    ) -> Result<(), ProcessError> {
        let Some(release) =
            ReleaseRepo::claim_for_processing(&self.pool, tag, project_id).await?
        else {
            tracing::debug!(tag, project_id, "No processable release, nothing to do");
            return Ok(());
        };

        tracing::info!(
            release_id = release.id,
            project_id,
            tag,
            "Processing release"
        );

        // Loading local context can fail like any remote step; route both
        // through the same FAILED bookkeeping below.
        let context = self.load_context(&release).await;

        if verify_sender {
            if let Ok((project, event)) = &context {
                if project.owner_id != Some(event.user_id) {
                    return Err(CoreError::InvalidSender {
                        event: event.id,
                        user: event.user_id,
                    }
                    .into());
                }
            }
        }

        let outcome = match &context {
            Ok((_, event)) => self.publish_release(&release, event).await,
            Err(failure) => Err(ProcessFailure::Data(failure.clone())),
        };

        // Unconditional status commit: exactly one of the two writes
        // below runs, whatever happened above.
        match outcome {
            Ok(record) => {
                ReleaseRepo::mark_published(&self.pool, release.id, record.record_id).await?;
                tracing::info!(
                    release_id = release.id,
                    record_id = %record.record_id,
                    tag,
                    "Release published"
                );
            }
            Err(failure) => {
                let payload = error_payload(&failure.to_string());
                ReleaseRepo::mark_failed(&self.pool, release.id, &payload).await?;
                tracing::error!(
                    release_id = release.id,
                    project_id,
                    tag,
                    error = %failure,
                    "Release processing failed"
                );
            }
        }

        Ok(())
    }

    /// Load the owning project and originating event for a claimed
    /// release.
    async fn load_context(&self, release: &Release) -> Result<(Project, HookEvent), String> {
        let project = ProjectRepo::find_by_id(&self.pool, release.project_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("project {} no longer exists", release.project_id))?;

        let event_id = release
            .event_id
            .ok_or_else(|| format!("release {} has no originating event", release.id))?;
        let event = EventRepo::find_by_id(&self.pool, event_id)
            .await
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("event {event_id} no longer exists"))?;

        Ok((project, event))
    }

    /// Gather release metadata, stream the archive, and publish.
    async fn publish_release(
        &self,
        release: &Release,
        event: &HookEvent,
    ) -> Result<PublishedRecord, ProcessFailure> {
        let payload = TagPushPayload::from_value(&event.payload)?;
        let gateway = self.gateways.for_user(event.user_id).await?;

        // Contributors are best-effort: a failure degrades to an empty
        // creator list, never a failed release.
        let creators = match gateway.contributors(payload.project_id).await {
            Ok(list) => list
                .into_iter()
                .filter(|c| !c.name.is_empty())
                .map(|c| Creator {
                    name: c.name,
                    affiliation: String::new(),
                })
                .collect(),
            Err(e) => {
                tracing::warn!(
                    release_id = release.id,
                    error = %e,
                    "Contributor lookup failed, continuing without creators"
                );
                Vec::new()
            }
        };

        let gl_tag = gateway.tag(payload.project_id, &release.tag).await?;
        let record_metadata = RecordMetadata::for_release(
            &payload.project,
            &release.tag,
            gl_tag.commit.created_at,
            creators,
        );

        let archive = gateway
            .archive(payload.project_id, &payload.checkout_sha)
            .await?;

        let mut deposit = self
            .publisher
            .create_draft(event.user_id, &record_metadata)
            .await?;
        let filename =
            metadata::archive_filename(&payload.project.path_with_namespace, &release.tag);
        deposit.attach_file(&filename, archive).await?;

        Ok(deposit.publish().await?)
    }
}

/// Build the structured error payload stored on a failed release:
/// the message plus, when a span is active, its id as a correlation
/// identifier for log lookup.
fn error_payload(message: &str) -> serde_json::Value {
    let mut payload = serde_json::json!({ "errors": message });
    if let Some(span_id) = tracing::Span::current().id() {
        payload["error_id"] = serde_json::json!(span_id.into_u64().to_string());
    }
    payload
}
