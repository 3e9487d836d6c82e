//! Tagvault intake pipeline.
//!
//! The synchronous half of the system:
//!
//! - [`registry`] — project registry operations
//!   (get/create/enable/disable/latest-release).
//! - [`release`] — release creation with the admission invariants.
//! - [`receiver`] — the per-event webhook intake handler.
//! - [`hooks`] — remote webhook install/remove tied to enable/disable.
//! - [`scheduler`] — the task-scheduler contract, task names, and the
//!   teardown retry policy.

pub mod error;
pub mod hooks;
pub mod receiver;
pub mod registry;
pub mod release;
pub mod scheduler;

pub use error::{IntakeError, IntakeResult};
pub use hooks::HookSettings;
pub use receiver::{handle, IntakeOutcome};
pub use registry::ProjectRegistry;
pub use release::create_release;
pub use scheduler::{
    DisconnectHooksArgs, HookRef, ProcessReleaseArgs, RetryPolicy, ScheduleError, TaskScheduler,
    DISCONNECT_HOOKS_TASK, PROCESS_RELEASE_TASK,
};
