use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod projects;
pub mod webhook;

/// Assemble the full route tree.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route(
            "/hooks/receivers/gitlab/events/{user_id}",
            post(webhook::receive_event),
        )
        .route(
            "/users/{user_id}/projects/{remote_id}/hook",
            post(projects::enable_project),
        )
        .route(
            "/users/{user_id}/projects/{remote_id}/hook",
            delete(projects::disable_project),
        )
        .route(
            "/users/{user_id}/projects/{remote_id}/releases/latest",
            get(projects::latest_release),
        )
}
