//! Tagvault processing worker.
//!
//! The asynchronous half of the system:
//!
//! - [`processor`] — drives a claimed release through fetch, metadata
//!   build, archive streaming, and publication.
//! - [`publisher`] — the record-publishing contract and its REST
//!   implementation.
//! - [`queue`] — in-process task queue implementing the intake
//!   pipeline's scheduler contract, plus the worker loop.
//! - [`teardown`] — account-disconnect webhook removal.

pub mod config;
pub mod processor;
pub mod publisher;
pub mod queue;
pub mod teardown;

pub use config::WorkerConfig;
pub use processor::{ProcessError, ReleaseProcessor};
pub use publisher::{Deposit, PublishError, PublishedRecord, RecordPublisher, RestPublisher};
pub use queue::{QueuedTask, TaskQueue, TaskRunner};
