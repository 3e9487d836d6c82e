//! Release creation: the admission path of the state machine.
//!
//! A release row is only ever created here, and only with status
//! RECEIVED. Every later transition belongs to the processing worker.

use sqlx::PgPool;
use tagvault_core::error::CoreError;
use tagvault_core::pattern;
use tagvault_core::payload::TagPushPayload;
use tagvault_db::models::{CreateRelease, HookEvent, Release};
use tagvault_db::repositories::ReleaseRepo;

use crate::error::IntakeResult;
use crate::registry::ProjectRegistry;

/// Create a release from a tag-push event, enforcing the admission
/// invariants in order:
///
/// 1. the ref must carry a `refs/tags/` prefix (MalformedEvent),
/// 2. the remote project must resolve for the event's user
///    (AccessDenied propagates),
/// 3. the tag must match the project's release pattern (NotAVersionTag,
///    a benign rejection),
/// 4. the `(tag, project)` pair must be unseen, whatever the previous
///    release's status (AlreadyReceived),
/// 5. the project must be enabled (ProjectDisabled, logged as a warning
///    since the remote hook should have been removed on disable).
pub async fn create_release(pool: &PgPool, event: &HookEvent) -> IntakeResult<Release> {
    let payload = TagPushPayload::from_value(&event.payload)?;
    let tag = payload.tag()?.to_string();

    let project =
        ProjectRegistry::get(pool, event.user_id, Some(payload.project_id), None, true).await?;

    if !pattern::tag_matches(&project.release_pattern, &tag) {
        return Err(CoreError::NotAVersionTag {
            tag,
            pattern: project.release_pattern,
        }
        .into());
    }

    if ReleaseRepo::find_by_tag(pool, &tag, project.id).await?.is_some() {
        return Err(CoreError::AlreadyReceived {
            tag,
            project: project.full_name,
        }
        .into());
    }

    if !project.enabled() {
        tracing::warn!(
            project_id = project.id,
            full_name = %project.full_name,
            tag = %tag,
            "Release creation attempt on disabled project"
        );
        return Err(CoreError::ProjectDisabled {
            project: project.full_name,
        }
        .into());
    }

    let release = ReleaseRepo::create(
        pool,
        &CreateRelease {
            tag,
            project_id: project.id,
            event_id: Some(event.id),
        },
    )
    .await?;

    tracing::info!(
        release_id = release.id,
        project_id = project.id,
        tag = %release.tag,
        "Release received"
    );
    Ok(release)
}
