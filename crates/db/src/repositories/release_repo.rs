//! Repository for the `releases` table.
//!
//! Status transitions away from RECEIVED are owned exclusively by the
//! processing worker; every status literal goes through
//! [`ReleaseStatus`](crate::models::status::ReleaseStatus).

use sqlx::PgPool;
use tagvault_core::types::DbId;
use uuid::Uuid;

use crate::models::release::{CreateRelease, Release};
use crate::models::status::ReleaseStatus;

/// Column list for `releases` queries.
const COLUMNS: &str = "id, tag, project_id, event_id, record_id, status_id, errors, \
     created_at, updated_at";

/// Provides persistence operations for releases.
pub struct ReleaseRepo;

impl ReleaseRepo {
    /// Insert a new release with status RECEIVED.
    ///
    /// The `(tag, project_id)` pair is protected by the
    /// `uq_releases_tag_project` constraint; callers pre-check for an
    /// existing row to reject duplicates with a domain error.
    pub async fn create(pool: &PgPool, input: &CreateRelease) -> Result<Release, sqlx::Error> {
        let query = format!(
            "INSERT INTO releases (tag, project_id, event_id, status_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Release>(&query)
            .bind(&input.tag)
            .bind(input.project_id)
            .bind(input.event_id)
            .bind(ReleaseStatus::Received.id())
            .fetch_one(pool)
            .await
    }

    /// Find a release by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Release>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM releases WHERE id = $1");
        sqlx::query_as::<_, Release>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the release for a `(tag, project)` pair, regardless of status.
    pub async fn find_by_tag(
        pool: &PgPool,
        tag: &str,
        project_id: DbId,
    ) -> Result<Option<Release>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM releases WHERE tag = $1 AND project_id = $2");
        sqlx::query_as::<_, Release>(&query)
            .bind(tag)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically claim a release for processing.
    ///
    /// Moves the `(tag, project_id)` release to PROCESSING only if its
    /// current status is RECEIVED or FAILED, as a single conditional
    /// update with `FOR UPDATE SKIP LOCKED` so two workers can never
    /// claim the same release. Returns `None` when there is no eligible
    /// candidate; the caller treats that as a harmless no-op.
    pub async fn claim_for_processing(
        pool: &PgPool,
        tag: &str,
        project_id: DbId,
    ) -> Result<Option<Release>, sqlx::Error> {
        let query = format!(
            "UPDATE releases
             SET status_id = $3, updated_at = NOW()
             WHERE id = (
                 SELECT id FROM releases
                 WHERE tag = $1 AND project_id = $2 AND status_id IN ($4, $5)
                 FOR UPDATE SKIP LOCKED
             )
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Release>(&query)
            .bind(tag)
            .bind(project_id)
            .bind(ReleaseStatus::Processing.id())
            .bind(ReleaseStatus::Received.id())
            .bind(ReleaseStatus::Failed.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a release as published, storing the published record's id and
    /// clearing any previous error payload.
    pub async fn mark_published(
        pool: &PgPool,
        id: DbId,
        record_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE releases
             SET status_id = $2, record_id = $3, errors = NULL, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ReleaseStatus::Published.id())
        .bind(record_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Mark a release as failed with a structured error payload.
    pub async fn mark_failed(
        pool: &PgPool,
        id: DbId,
        errors: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE releases
             SET status_id = $2, errors = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(ReleaseStatus::Failed.id())
        .bind(errors)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Most recently created release of a project, optionally filtered by
    /// status.
    pub async fn latest_for_project(
        pool: &PgPool,
        project_id: DbId,
        status: Option<ReleaseStatus>,
    ) -> Result<Option<Release>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM releases
             WHERE project_id = $1 AND ($2::SMALLINT IS NULL OR status_id = $2)
             ORDER BY created_at DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Release>(&query)
            .bind(project_id)
            .bind(status.map(ReleaseStatus::id))
            .fetch_optional(pool)
            .await
    }

    /// List releases awaiting their first processing attempt, oldest
    /// first. FAILED releases are deliberately excluded: they are only
    /// retried when explicitly re-enqueued.
    pub async fn list_received(pool: &PgPool, limit: i64) -> Result<Vec<Release>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM releases
             WHERE status_id = $1
             ORDER BY created_at ASC
             LIMIT $2"
        );
        sqlx::query_as::<_, Release>(&query)
            .bind(ReleaseStatus::Received.id())
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Number of releases recorded for a `(tag, project)` pair.
    pub async fn count_for_tag(
        pool: &PgPool,
        tag: &str,
        project_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM releases WHERE tag = $1 AND project_id = $2")
                .bind(tag)
                .bind(project_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}
