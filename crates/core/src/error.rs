use crate::types::DbId;

/// Domain error taxonomy for the release-intake pipeline.
///
/// Admission and identity errors (`MalformedEvent`, `NotAVersionTag`,
/// `AlreadyReceived`, `ProjectDisabled`, `AccessDenied`) are resolved
/// entirely within the synchronous intake path and never reach the
/// asynchronous worker.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The inbound payload is missing the expected ref/tag structure.
    #[error("Malformed event payload: {0}")]
    MalformedEvent(String),

    /// The pushed tag does not match the project's release pattern.
    /// Benign: no release is created and the event is rejected politely.
    #[error("{tag} is not a version tag according to pattern {pattern}")]
    NotAVersionTag { tag: String, pattern: String },

    /// A release for this `(tag, project)` pair already exists,
    /// regardless of its current status.
    #[error("Release {tag} of project {project} has already been received")]
    AlreadyReceived { tag: String, project: String },

    /// The project exists but has no active hook/owner.
    #[error("Project {project} is not enabled for webhooks")]
    ProjectDisabled { project: String },

    /// The requesting user does not own the project.
    #[error("User {user} cannot access project {project}")]
    AccessDenied { user: DbId, project: String },

    /// Optional sender verification failed during processing. Aborts the
    /// task without marking the release failed.
    #[error("Invalid sender for event {event} and user {user}")]
    InvalidSender { event: DbId, user: DbId },

    /// No matching entity.
    #[error("Entity not found: {entity}")]
    NotFound { entity: &'static str },

    /// More than one logical match for a project lookup.
    #[error("Ambiguous project lookup: {0}")]
    Ambiguous(String),

    /// Input failed validation (e.g. an explicitly empty release pattern).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Anything unexpected.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for rejections the intake path reports as conflict-class
    /// (HTTP 409) responses: benign, idempotent, never retried.
    pub fn is_benign_rejection(&self) -> bool {
        matches!(
            self,
            CoreError::NotAVersionTag { .. }
                | CoreError::AlreadyReceived { .. }
                | CoreError::ProjectDisabled { .. }
        )
    }
}
