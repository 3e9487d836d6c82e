//! Repository for the `projects` table.

use sqlx::PgPool;
use tagvault_core::types::DbId;

use crate::models::project::{CreateProject, Project};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, remote_id, full_name, owner_id, hook_id, release_pattern, \
     pinged_at, created_at, updated_at";

/// Provides CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a new project, returning the created row.
    ///
    /// If `release_pattern` is `None` in the input, defaults to `v*`.
    pub async fn create(pool: &PgPool, input: &CreateProject) -> Result<Project, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (owner_id, remote_id, full_name, release_pattern)
             VALUES ($1, $2, $3, COALESCE($4, 'v*'))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(input.owner_id)
            .bind(input.remote_id)
            .bind(&input.full_name)
            .bind(&input.release_pattern)
            .fetch_one(pool)
            .await
    }

    /// Find a project by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a project by its remote (GitLab-side) identifier.
    pub async fn find_by_remote_id(
        pool: &PgPool,
        remote_id: i64,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM projects WHERE remote_id = $1");
        sqlx::query_as::<_, Project>(&query)
            .bind(remote_id)
            .fetch_optional(pool)
            .await
    }

    /// Find projects matching a remote id OR a full name. Either argument
    /// may be absent; an absent argument matches nothing.
    ///
    /// At most two rows are returned, enough for the caller to
    /// distinguish "none", "one", and "ambiguous".
    pub async fn find_matching(
        pool: &PgPool,
        remote_id: Option<i64>,
        full_name: Option<&str>,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE ($1::BIGINT IS NOT NULL AND remote_id = $1)
                OR ($2::VARCHAR IS NOT NULL AND full_name = $2)
             ORDER BY id
             LIMIT 2"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(remote_id)
            .bind(full_name)
            .fetch_all(pool)
            .await
    }

    /// Set the owner and hook on a project, enabling webhook intake.
    pub async fn set_hook(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        hook_id: i64,
    ) -> Result<Project, sqlx::Error> {
        let query = format!(
            "UPDATE projects
             SET owner_id = $2, hook_id = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(hook_id)
            .fetch_one(pool)
            .await
    }

    /// Clear the owner and hook on a project in one statement, disabling
    /// webhook intake. Returns `true` if a row was updated.
    pub async fn clear_hook(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects
             SET owner_id = NULL, hook_id = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List a user's projects that currently have an installed hook.
    pub async fn list_hooked_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects
             WHERE owner_id = $1 AND hook_id IS NOT NULL
             ORDER BY full_name"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(owner_id)
            .fetch_all(pool)
            .await
    }

    /// Remove ownership (and hooks) from a user's projects whose remote id
    /// is not in `keep_remote_ids`. Used when a registry sync finds the
    /// user no longer owns them remotely. Returns the number of projects
    /// released.
    pub async fn release_ownership(
        pool: &PgPool,
        owner_id: DbId,
        keep_remote_ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE projects
             SET owner_id = NULL, hook_id = NULL, updated_at = NOW()
             WHERE owner_id = $1
               AND (remote_id IS NULL OR remote_id <> ALL($2))",
        )
        .bind(owner_id)
        .bind(keep_remote_ids)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Update the qualified name after a remote rename.
    pub async fn rename(
        pool: &PgPool,
        id: DbId,
        full_name: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE projects SET full_name = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(full_name)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record that GitLab delivered an event for this project.
    pub async fn touch_ping(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE projects SET pinged_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
