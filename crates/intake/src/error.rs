use tagvault_core::error::CoreError;

use crate::scheduler::ScheduleError;

/// Error type for the intake pipeline.
///
/// Wraps [`CoreError`] for domain rejections and adds the
/// infrastructure failures the pipeline can hit.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    /// A domain-level rejection or fault.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Enqueueing the processing task failed.
    #[error("Scheduling error: {0}")]
    Schedule(#[from] ScheduleError),

    /// A remote platform call failed during hook management.
    #[error("Gateway error: {0}")]
    Gateway(#[from] tagvault_gitlab::GitLabError),
}

/// Convenience type alias for intake operations.
pub type IntakeResult<T> = Result<T, IntakeError>;
