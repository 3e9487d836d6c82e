//! Typed views of the GitLab REST API responses the gateway consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A project as returned by `GET /projects/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct GlProject {
    pub id: i64,
    pub name: String,
    pub path_with_namespace: String,
    pub description: Option<String>,
    pub web_url: String,
}

/// A tag as returned by `GET /projects/:id/repository/tags/:name`.
#[derive(Debug, Clone, Deserialize)]
pub struct GlTag {
    pub name: String,
    pub commit: GlCommit,
}

/// Commit block embedded in a tag response.
#[derive(Debug, Clone, Deserialize)]
pub struct GlCommit {
    pub id: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of `GET /projects/:id/repository/contributors`.
#[derive(Debug, Clone, Deserialize)]
pub struct GlContributor {
    pub name: String,
}

/// A webhook as returned by the hooks endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct GlHook {
    pub id: i64,
    pub url: String,
}

/// Attributes for installing a project webhook.
///
/// Only tag-push events are subscribed; the shared `token` lets the
/// receiving side authenticate deliveries.
#[derive(Debug, Clone, Serialize)]
pub struct HookAttrs {
    pub url: String,
    pub push_events: bool,
    pub tag_push_events: bool,
    pub token: String,
    pub enable_ssl_verification: bool,
}

impl HookAttrs {
    /// Standard attributes for a tag-push-only webhook.
    pub fn tag_push(url: impl Into<String>, token: impl Into<String>, verify_ssl: bool) -> Self {
        Self {
            url: url.into(),
            push_events: false,
            tag_push_events: true,
            token: token.into(),
            enable_ssl_verification: verify_ssl,
        }
    }
}
