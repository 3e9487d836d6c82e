//! Project hook management endpoints.
//!
//! Thin HTTP surface over the registry and the gateway. The acting
//! user is carried in the path; authentication of that user belongs to
//! the surrounding (external) account layer.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use tagvault_core::types::DbId;
use tagvault_db::models::ReleaseStatus;
use tagvault_gitlab::{GitLabClient, GitLabError};
use tagvault_intake::{hooks, ProjectRegistry};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Query parameters for the latest-release lookup.
#[derive(Debug, Deserialize)]
pub struct LatestReleaseQuery {
    /// Optional status name filter (`received`, `processing`,
    /// `published`, `failed`, `deleted`).
    pub status: Option<String>,
}

fn gateway_for(state: &AppState) -> Result<GitLabClient, GitLabError> {
    GitLabClient::new(&state.config.gitlab, state.config.gitlab_token.as_str())
}

/// Install the remote webhook and enable the project.
pub async fn enable_project(
    State(state): State<AppState>,
    Path((user_id, remote_id)): Path<(DbId, i64)>,
) -> AppResult<impl IntoResponse> {
    let gateway = gateway_for(&state).map_err(|e| AppError::Gateway(e.to_string()))?;
    let settings = state.config.hook_settings();

    let project =
        hooks::install_project_hook(&state.pool, &gateway, &settings, user_id, remote_id).await?;

    tracing::info!(
        project_id = project.id,
        full_name = %project.full_name,
        user_id,
        "Project enabled"
    );
    Ok((StatusCode::CREATED, Json(project)))
}

/// Remove the remote webhook and disable the project.
pub async fn disable_project(
    State(state): State<AppState>,
    Path((user_id, remote_id)): Path<(DbId, i64)>,
) -> AppResult<impl IntoResponse> {
    let gateway = gateway_for(&state).map_err(|e| AppError::Gateway(e.to_string()))?;

    let project = hooks::remove_project_hook(&state.pool, &gateway, user_id, remote_id).await?;

    tracing::info!(
        project_id = project.id,
        full_name = %project.full_name,
        user_id,
        "Project disabled"
    );
    Ok(Json(project))
}

/// Most recent release of a project, optionally filtered by status.
pub async fn latest_release(
    State(state): State<AppState>,
    Path((user_id, remote_id)): Path<(DbId, i64)>,
    Query(query): Query<LatestReleaseQuery>,
) -> AppResult<impl IntoResponse> {
    let status = match query.status.as_deref() {
        None => None,
        Some("received") => Some(ReleaseStatus::Received),
        Some("processing") => Some(ReleaseStatus::Processing),
        Some("published") => Some(ReleaseStatus::Published),
        Some("failed") => Some(ReleaseStatus::Failed),
        Some("deleted") => Some(ReleaseStatus::Deleted),
        Some(other) => {
            return Err(AppError::Core(
                tagvault_core::CoreError::Validation(format!("unknown status {other:?}")),
            ))
        }
    };

    let project =
        ProjectRegistry::get(&state.pool, user_id, Some(remote_id), None, true).await?;
    let release = ProjectRegistry::latest_release(&state.pool, &project, status).await?;

    Ok(Json(release))
}
