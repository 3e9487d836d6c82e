//! Inbound webhook event model.
//!
//! Minimal persisted form of the event-delivery contract: the raw
//! payload, the acting user, and the recorded response. Releases
//! reference these rows via `event_id` and the worker re-reads the
//! original payload from here.

use serde::Serialize;
use sqlx::FromRow;
use tagvault_core::types::{DbId, Timestamp};

/// A row from the `hook_events` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HookEvent {
    pub id: DbId,
    pub payload: serde_json::Value,
    pub user_id: DbId,
    /// Response recorded for non-202 outcomes.
    pub response_code: Option<i16>,
    pub response_body: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
