//! Task-scheduler contract and task argument types.
//!
//! The actual execution pool is an external collaborator with
//! at-least-once delivery; the pipeline only depends on `enqueue`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagvault_core::types::DbId;

/// Task name for asynchronous release processing.
pub const PROCESS_RELEASE_TASK: &str = "process_release";

/// Task name for remote webhook removal after an account disconnect.
pub const DISCONNECT_HOOKS_TASK: &str = "disconnect_hooks";

/// Arguments for [`PROCESS_RELEASE_TASK`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessReleaseArgs {
    pub tag: String,
    pub project_id: DbId,
    #[serde(default)]
    pub verify_sender: bool,
}

/// One hooked project scheduled for remote webhook removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookRef {
    pub remote_id: i64,
    pub hook_id: i64,
}

/// Arguments for [`DISCONNECT_HOOKS_TASK`].
///
/// Carries the user's access token explicitly: by the time the task
/// runs, the account (and its stored token) is already gone locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisconnectHooksArgs {
    pub user_id: DbId,
    pub token: String,
    pub hooks: Vec<HookRef>,
}

/// Error type for enqueue failures.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The queue no longer accepts tasks (receiver dropped / shut down).
    #[error("Task queue is closed")]
    QueueClosed,

    /// Task arguments could not be serialized.
    #[error("Task arguments could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Hands tasks to the asynchronous execution pool.
#[async_trait]
pub trait TaskScheduler: Send + Sync {
    async fn enqueue(&self, task: &str, args: serde_json::Value) -> Result<(), ScheduleError>;
}

/// Retry schedule for a task, applied by the executing side.
///
/// Delays double per attempt starting from `base_delay`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Reference policy for webhook teardown: 6 retries, 10-minute base.
    pub const fn teardown() -> Self {
        Self {
            max_retries: 6,
            base_delay: Duration::from_secs(600),
        }
    }

    /// Delay before retry number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}
