//! Webhook receiver endpoint.
//!
//! `POST /hooks/receivers/gitlab/events/{user_id}` is the URL installed
//! into GitLab project hooks. The path carries the user the hook was
//! installed for; the shared secret in `X-Gitlab-Token` authenticates
//! the sender. Request signing and user resolution beyond this belong
//! to the surrounding delivery framework.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use tagvault_core::types::DbId;
use tagvault_db::repositories::EventRepo;
use tagvault_intake::{receiver, IntakeOutcome};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Header GitLab echoes the hook's shared secret in.
const GITLAB_TOKEN_HEADER: &str = "X-Gitlab-Token";

/// Receive one webhook delivery.
pub async fn receive_event(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    headers: HeaderMap,
    Json(payload): Json<serde_json::Value>,
) -> AppResult<impl IntoResponse> {
    let token = headers
        .get(GITLAB_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if token != state.config.webhook_secret {
        return Err(AppError::Unauthorized(
            "Missing or invalid webhook token".to_string(),
        ));
    }

    let event = EventRepo::insert(&state.pool, &payload, user_id).await?;

    match receiver::handle(&state.pool, &state.queue, &event).await? {
        IntakeOutcome::Accepted(release) => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "status": 202,
                "message": "Release received",
                "release_id": release.id,
            })),
        )),
        IntakeOutcome::Rejected(code) => {
            // The handler recorded the response on the event row.
            let stored = EventRepo::find_by_id(&state.pool, event.id).await?;
            let body = stored
                .and_then(|e| e.response_body)
                .unwrap_or_else(|| json!({"status": code}));
            let status = StatusCode::from_u16(code)
                .map_err(|_| AppError::Internal(format!("invalid status code {code}")))?;
            Ok((status, Json(body)))
        }
        IntakeOutcome::Ignored => Ok((
            StatusCode::ACCEPTED,
            Json(json!({
                "status": 202,
                "message": "Event ignored",
            })),
        )),
    }
}
