//! Remote webhook management.
//!
//! Connects the registry to the gateway: installing a hook on GitLab
//! and enabling the local project are one user-facing operation, as is
//! the reverse.

use sqlx::PgPool;
use tagvault_core::types::DbId;
use tagvault_db::models::Project;
use tagvault_gitlab::types::HookAttrs;
use tagvault_gitlab::GitLabGateway;

use crate::error::IntakeResult;
use crate::registry::ProjectRegistry;

/// Receiver-side parameters baked into every installed hook.
#[derive(Debug, Clone)]
pub struct HookSettings {
    /// URL GitLab delivers tag-push events to.
    pub receiver_url: String,
    /// Shared secret GitLab echoes in `X-Gitlab-Token`.
    pub secret: String,
    /// Whether GitLab should verify our TLS certificate.
    pub verify_ssl: bool,
}

/// Install a tag-push webhook on the remote project and enable the
/// local one. The remote install is idempotent (a stale hook pointing
/// at the same receiver is replaced), and so is the local enable.
pub async fn install_project_hook<G: GitLabGateway>(
    pool: &PgPool,
    gateway: &G,
    settings: &HookSettings,
    user_id: DbId,
    remote_id: i64,
) -> IntakeResult<Project> {
    let gl_project = gateway.project(remote_id).await?;

    let attrs = HookAttrs::tag_push(
        settings.receiver_url.clone(),
        settings.secret.clone(),
        settings.verify_ssl,
    );
    let hook_id = gateway.install_hook(remote_id, &attrs).await?;

    ProjectRegistry::enable(
        pool,
        user_id,
        remote_id,
        &gl_project.path_with_namespace,
        hook_id,
    )
    .await
}

/// Remove the remote webhook (if one is recorded) and disable the local
/// project. Fails with `NotFound` when no local project matches.
pub async fn remove_project_hook<G: GitLabGateway>(
    pool: &PgPool,
    gateway: &G,
    user_id: DbId,
    remote_id: i64,
) -> IntakeResult<Project> {
    let project = ProjectRegistry::get(pool, user_id, Some(remote_id), None, true).await?;

    if let Some(hook_id) = project.hook_id {
        gateway.remove_hook(remote_id, hook_id).await?;
    }

    ProjectRegistry::disable(pool, user_id, Some(remote_id), None).await
}
