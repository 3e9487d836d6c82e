//! Account-disconnect teardown.
//!
//! Disconnecting a user clears their project ownership locally right
//! away, then schedules remote webhook removal as a retried task. Local
//! state is never rolled back when remote removal fails.

use sqlx::PgPool;
use tagvault_core::types::DbId;
use tagvault_db::repositories::ProjectRepo;
use tagvault_gitlab::GitLabGateway;
use tagvault_intake::{
    DisconnectHooksArgs, HookRef, IntakeError, ScheduleError, TaskScheduler,
    DISCONNECT_HOOKS_TASK,
};

/// Error type for a teardown run that left hooks behind.
#[derive(Debug, thiserror::Error)]
#[error("Failed to remove {failed} of {total} webhooks")]
pub struct TeardownError {
    pub failed: usize,
    pub total: usize,
}

/// Unlink all of a user's projects and schedule remote hook removal.
///
/// Returns the number of hooks handed to the scheduler. The user's
/// access token is captured into the task arguments because the local
/// account record is deleted right after this call.
pub async fn disconnect_user<S: TaskScheduler>(
    pool: &PgPool,
    scheduler: &S,
    user_id: DbId,
    token: &str,
) -> Result<usize, IntakeError> {
    let projects = ProjectRepo::list_hooked_by_owner(pool, user_id).await?;

    let hooks: Vec<HookRef> = projects
        .iter()
        .filter_map(|p| {
            Some(HookRef {
                remote_id: p.remote_id?,
                hook_id: p.hook_id?,
            })
        })
        .collect();

    for project in &projects {
        ProjectRepo::clear_hook(pool, project.id).await?;
    }

    tracing::info!(
        user_id,
        projects = projects.len(),
        hooks = hooks.len(),
        "User disconnected, scheduling remote webhook removal"
    );

    let count = hooks.len();
    if count > 0 {
        let args = DisconnectHooksArgs {
            user_id,
            token: token.to_string(),
            hooks,
        };
        let args = serde_json::to_value(&args).map_err(ScheduleError::from)?;
        scheduler.enqueue(DISCONNECT_HOOKS_TASK, args).await?;
    }

    Ok(count)
}

/// Task body: remove the listed webhooks from GitLab.
///
/// Failures are logged per hook and reported in aggregate so the task
/// framework can retry the whole batch; removals are idempotent on the
/// GitLab side.
pub async fn remove_hooks<G: GitLabGateway>(
    gateway: &G,
    args: &DisconnectHooksArgs,
) -> Result<(), TeardownError> {
    let mut failed = 0;

    for hook in &args.hooks {
        if let Err(e) = gateway.remove_hook(hook.remote_id, hook.hook_id).await {
            tracing::warn!(
                user_id = args.user_id,
                remote_id = hook.remote_id,
                hook_id = hook.hook_id,
                error = %e,
                "Webhook removal failed"
            );
            failed += 1;
        }
    }

    if failed > 0 {
        return Err(TeardownError {
            failed,
            total: args.hooks.len(),
        });
    }
    Ok(())
}
