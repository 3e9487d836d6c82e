//! Webhook intake handler.
//!
//! The synchronous entry point invoked once per delivered event. Domain
//! rejections are converted into recorded response codes on the event;
//! anything unexpected propagates to the delivery framework.

use sqlx::PgPool;
use tagvault_core::error::CoreError;
use tagvault_core::payload::TAG_PUSH_KIND;
use tagvault_db::models::{HookEvent, Release};
use tagvault_db::repositories::{EventRepo, ProjectRepo};

use crate::error::{IntakeError, IntakeResult};
use crate::release::create_release;
use crate::scheduler::{ProcessReleaseArgs, ScheduleError, TaskScheduler, PROCESS_RELEASE_TASK};

/// What the handler did with an event.
#[derive(Debug)]
pub enum IntakeOutcome {
    /// A release was created and queued for processing (202).
    Accepted(Release),
    /// The event was rejected with the recorded status code.
    Rejected(u16),
    /// The payload kind is not a tag push; nothing was done.
    Ignored,
}

/// Handle one inbound webhook event.
///
/// Dispatches only on tag-push payloads. On success the release is
/// handed to the scheduler under the `(tag, project_id)` task key.
/// Benign rejections record 409, access violations 403, and malformed
/// payloads 400 on the event; other failures bubble up.
pub async fn handle<S: TaskScheduler>(
    pool: &PgPool,
    scheduler: &S,
    event: &HookEvent,
) -> IntakeResult<IntakeOutcome> {
    let kind = event.payload.get("object_kind").and_then(|v| v.as_str());
    if kind != Some(TAG_PUSH_KIND) {
        return Ok(IntakeOutcome::Ignored);
    }

    match create_release(pool, event).await {
        Ok(release) => {
            ProjectRepo::touch_ping(pool, release.project_id).await?;

            let args = ProcessReleaseArgs {
                tag: release.tag.clone(),
                project_id: release.project_id,
                verify_sender: false,
            };
            let args = serde_json::to_value(&args).map_err(ScheduleError::from)?;
            scheduler
                .enqueue(PROCESS_RELEASE_TASK, args)
                .await
                .map_err(IntakeError::from)?;

            Ok(IntakeOutcome::Accepted(release))
        }
        Err(IntakeError::Core(e)) => {
            let code = match &e {
                _ if e.is_benign_rejection() => 409,
                CoreError::AccessDenied { .. } => 403,
                CoreError::MalformedEvent(_) => 400,
                _ => return Err(e.into()),
            };
            record_rejection(pool, event, code, &e).await?;
            Ok(IntakeOutcome::Rejected(code))
        }
        Err(e) => Err(e),
    }
}

/// Record a rejection response on the event row.
async fn record_rejection(
    pool: &PgPool,
    event: &HookEvent,
    code: u16,
    error: &CoreError,
) -> IntakeResult<()> {
    let body = serde_json::json!({
        "status": code,
        "message": error.to_string(),
    });
    EventRepo::set_response(pool, event.id, code as i16, &body).await?;
    Ok(())
}
