//! Project registry operations.
//!
//! Wraps [`ProjectRepo`] with the lookup, ownership, and
//! enable/disable semantics of the registry: which remote projects are
//! under management, who owns them, and which tag pattern admits their
//! releases.

use sqlx::PgPool;
use tagvault_core::error::CoreError;
use tagvault_core::types::DbId;
use tagvault_db::models::{CreateProject, Project, Release, ReleaseStatus};
use tagvault_db::repositories::{ProjectRepo, ReleaseRepo};

use crate::error::{IntakeError, IntakeResult};

/// Registry operations over managed projects.
pub struct ProjectRegistry;

impl ProjectRegistry {
    /// Look up a project by remote id OR full name (either may be given).
    ///
    /// Fails with `NotFound` on zero matches and `Ambiguous` when the id
    /// and the name resolve to different rows. With `check_owner`, a
    /// project owned by a different user yields `AccessDenied`;
    /// unclaimed projects (null owner) pass the check.
    pub async fn get(
        pool: &PgPool,
        user_id: DbId,
        remote_id: Option<i64>,
        full_name: Option<&str>,
        check_owner: bool,
    ) -> IntakeResult<Project> {
        let mut matches = ProjectRepo::find_matching(pool, remote_id, full_name).await?;

        if matches.len() > 1 {
            return Err(CoreError::Ambiguous(format!(
                "remote id {remote_id:?} and name {full_name:?} resolve to different projects"
            ))
            .into());
        }
        let Some(project) = matches.pop() else {
            return Err(CoreError::NotFound { entity: "Project" }.into());
        };

        if check_owner {
            if let Some(owner_id) = project.owner_id {
                if owner_id != user_id {
                    return Err(CoreError::AccessDenied {
                        user: user_id,
                        project: project.full_name,
                    }
                    .into());
                }
            }
        }

        Ok(project)
    }

    /// Register a new project under the given owner.
    ///
    /// An explicitly supplied pattern replaces the default and must be
    /// non-empty; glob syntax itself is permissive and not validated.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        remote_id: Option<i64>,
        full_name: &str,
        pattern: Option<&str>,
    ) -> IntakeResult<Project> {
        if let Some(pattern) = pattern {
            if pattern.trim().is_empty() {
                return Err(
                    CoreError::Validation("release pattern must not be empty".to_string()).into(),
                );
            }
        }

        let project = ProjectRepo::create(
            pool,
            &CreateProject {
                owner_id: user_id,
                remote_id,
                full_name: full_name.to_string(),
                release_pattern: pattern.map(str::to_string),
            },
        )
        .await?;

        tracing::info!(
            project_id = project.id,
            full_name = %project.full_name,
            "Project registered"
        );
        Ok(project)
    }

    /// Enable webhook intake for a project: get-or-create, then store the
    /// owner and the installed hook id. Idempotent: repeating the call
    /// leaves a single row carrying the latest hook id.
    pub async fn enable(
        pool: &PgPool,
        user_id: DbId,
        remote_id: i64,
        full_name: &str,
        hook_id: i64,
    ) -> IntakeResult<Project> {
        let project =
            match Self::get(pool, user_id, Some(remote_id), Some(full_name), true).await {
                Ok(project) => project,
                Err(IntakeError::Core(CoreError::NotFound { .. })) => {
                    Self::create(pool, user_id, Some(remote_id), full_name, None).await?
                }
                Err(e) => return Err(e),
            };

        Ok(ProjectRepo::set_hook(pool, project.id, user_id, hook_id).await?)
    }

    /// Disable webhook intake: clear owner and hook on the matched
    /// project. Fails with `NotFound` if no project matches.
    pub async fn disable(
        pool: &PgPool,
        user_id: DbId,
        remote_id: Option<i64>,
        full_name: Option<&str>,
    ) -> IntakeResult<Project> {
        let project = Self::get(pool, user_id, remote_id, full_name, true).await?;
        ProjectRepo::clear_hook(pool, project.id).await?;

        tracing::info!(
            project_id = project.id,
            full_name = %project.full_name,
            "Project disabled"
        );
        // Re-read so the caller sees the cleared fields.
        ProjectRepo::find_by_id(pool, project.id)
            .await?
            .ok_or_else(|| CoreError::NotFound { entity: "Project" }.into())
    }

    /// Most recently created release of a project, optionally filtered by
    /// status. Returns `None` when the project has no matching releases.
    pub async fn latest_release(
        pool: &PgPool,
        project: &Project,
        status: Option<ReleaseStatus>,
    ) -> IntakeResult<Option<Release>> {
        Ok(ReleaseRepo::latest_for_project(pool, project.id, status).await?)
    }
}
