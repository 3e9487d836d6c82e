//! Release entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tagvault_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::models::status::{ReleaseStatus, StatusId};

/// A release row from the `releases` table.
///
/// `(tag, project_id)` is unique for the lifetime of the project; a
/// re-push of the same tag never creates a second row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Release {
    pub id: DbId,
    /// Tag name extracted from the pushed ref.
    pub tag: String,
    pub project_id: DbId,
    /// Originating inbound event, if still linked.
    pub event_id: Option<DbId>,
    /// Identifier of the published archival record.
    pub record_id: Option<Uuid>,
    pub status_id: StatusId,
    /// Structured diagnostic payload captured on failure.
    pub errors: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Release {
    /// Typed view of `status_id`.
    pub fn status(&self) -> Option<ReleaseStatus> {
        ReleaseStatus::from_id(self.status_id)
    }
}

/// DTO for creating a new release. Status is always RECEIVED at creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRelease {
    pub tag: String,
    pub project_id: DbId,
    pub event_id: Option<DbId>,
}
