//! Project entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tagvault_core::types::{DbId, Timestamp};

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    /// GitLab-side project identifier. Unique, null until linked.
    pub remote_id: Option<i64>,
    /// Fully qualified name including namespace, e.g. `group/archiver`.
    pub full_name: String,
    /// Managing user. Null means unclaimed/disabled.
    pub owner_id: Option<DbId>,
    /// Installed remote webhook identifier.
    pub hook_id: Option<i64>,
    /// Glob pattern admitting release tags.
    pub release_pattern: String,
    /// Last time GitLab delivered an event for this project.
    pub pinged_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Project {
    /// A project is enabled iff it has both an installed hook and an owner.
    pub fn enabled(&self) -> bool {
        self.hook_id.is_some() && self.owner_id.is_some()
    }
}

/// DTO for creating a new project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub owner_id: DbId,
    pub remote_id: Option<i64>,
    pub full_name: String,
    /// Defaults to `v*` if omitted.
    pub release_pattern: Option<String>,
}
