//! Repository for the `hook_events` table.

use sqlx::PgPool;
use tagvault_core::types::DbId;

use crate::models::event::HookEvent;

/// Column list for `hook_events` queries.
const COLUMNS: &str = "id, payload, user_id, response_code, response_body, \
     created_at, updated_at";

/// Provides persistence operations for inbound webhook events.
pub struct EventRepo;

impl EventRepo {
    /// Persist a newly delivered event payload.
    pub async fn insert(
        pool: &PgPool,
        payload: &serde_json::Value,
        user_id: DbId,
    ) -> Result<HookEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO hook_events (payload, user_id)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HookEvent>(&query)
            .bind(payload)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    /// Record the response for a non-202 outcome.
    pub async fn set_response(
        pool: &PgPool,
        id: DbId,
        code: i16,
        body: &serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE hook_events
             SET response_code = $2, response_body = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(body)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find an event by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<HookEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM hook_events WHERE id = $1");
        sqlx::query_as::<_, HookEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
