//! Inbound webhook payload types and ref parsing.
//!
//! The event-delivery layer hands the intake pipeline a raw JSON payload;
//! [`TagPushPayload`] is the typed view of the fields the pipeline reads.

use serde::Deserialize;

use crate::error::CoreError;

/// Payload kind that triggers release intake. All other kinds are ignored.
pub const TAG_PUSH_KIND: &str = "tag_push";

/// Prefix carried by tag refs, e.g. `refs/tags/v1.0.0`.
const TAG_REF_PREFIX: &str = "refs/tags/";

/// The fields of a GitLab tag-push event the pipeline consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct TagPushPayload {
    pub object_kind: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Commit SHA the tag points at.
    pub checkout_sha: String,
    /// Remote (GitLab-side) project identifier.
    pub project_id: i64,
    pub project: ProjectInfo,
}

/// Project block embedded in the webhook payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub path_with_namespace: String,
    pub description: Option<String>,
    pub web_url: String,
}

impl TagPushPayload {
    /// Parse the raw event payload.
    pub fn from_value(payload: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(payload.clone())
            .map_err(|e| CoreError::MalformedEvent(e.to_string()))
    }

    /// Extract the tag name from the payload's ref.
    pub fn tag(&self) -> Result<&str, CoreError> {
        extract_tag(&self.git_ref)
    }
}

/// Extract a tag name from a `refs/tags/<tag>` ref.
pub fn extract_tag(git_ref: &str) -> Result<&str, CoreError> {
    match git_ref.strip_prefix(TAG_REF_PREFIX) {
        Some(tag) if !tag.is_empty() => Ok(tag),
        _ => Err(CoreError::MalformedEvent(format!(
            "expected a refs/tags/ ref, got {git_ref:?}"
        ))),
    }
}
