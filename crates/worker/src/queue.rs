//! In-process task queue and the worker loop draining it.
//!
//! [`TaskQueue`] implements the intake pipeline's [`TaskScheduler`]
//! contract over a bounded tokio mpsc channel; [`TaskRunner`] is the
//! long-lived consumer that dispatches queued tasks to the release
//! processor and the teardown body. The loop exits when every queue
//! handle is dropped.

use async_trait::async_trait;
use tokio::sync::mpsc;

use tagvault_gitlab::{GatewayFactory, GitLabClient, GitLabConfig};
use tagvault_intake::{
    DisconnectHooksArgs, ProcessReleaseArgs, RetryPolicy, ScheduleError, TaskScheduler,
    DISCONNECT_HOOKS_TASK, PROCESS_RELEASE_TASK,
};

use crate::processor::ReleaseProcessor;
use crate::publisher::RecordPublisher;
use crate::teardown;

/// Default buffer capacity for the task channel.
const DEFAULT_CAPACITY: usize = 256;

/// One enqueued task: name plus JSON arguments.
#[derive(Debug, Clone)]
pub struct QueuedTask {
    pub task: String,
    pub args: serde_json::Value,
}

/// Producer half of the in-process task queue.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::Sender<QueuedTask>,
}

impl TaskQueue {
    /// Create a queue with the default capacity, returning the producer
    /// and the receiver to hand to [`TaskRunner::run`].
    pub fn new() -> (Self, mpsc::Receiver<QueuedTask>) {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<QueuedTask>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl TaskScheduler for TaskQueue {
    async fn enqueue(&self, task: &str, args: serde_json::Value) -> Result<(), ScheduleError> {
        self.sender
            .send(QueuedTask {
                task: task.to_string(),
                args,
            })
            .await
            .map_err(|_| ScheduleError::QueueClosed)
    }
}

/// Long-lived consumer of the task queue.
pub struct TaskRunner<F, P> {
    processor: ReleaseProcessor<F, P>,
    gitlab: GitLabConfig,
    teardown_retry: RetryPolicy,
}

impl<F, P> TaskRunner<F, P>
where
    F: GatewayFactory,
    P: RecordPublisher,
{
    pub fn new(processor: ReleaseProcessor<F, P>, gitlab: GitLabConfig) -> Self {
        Self {
            processor,
            gitlab,
            teardown_retry: RetryPolicy::teardown(),
        }
    }

    /// Drain the queue until it closes.
    pub async fn run(&self, mut receiver: mpsc::Receiver<QueuedTask>) {
        while let Some(task) = receiver.recv().await {
            self.dispatch(task).await;
        }
        tracing::info!("Task queue closed, worker shutting down");
    }

    async fn dispatch(&self, task: QueuedTask) {
        match task.task.as_str() {
            PROCESS_RELEASE_TASK => match serde_json::from_value::<ProcessReleaseArgs>(task.args) {
                Ok(args) => {
                    if let Err(e) = self
                        .processor
                        .process(&args.tag, args.project_id, args.verify_sender)
                        .await
                    {
                        tracing::error!(
                            tag = %args.tag,
                            project_id = args.project_id,
                            error = %e,
                            "Release processing task failed"
                        );
                    }
                }
                Err(e) => tracing::error!(error = %e, "Invalid process_release arguments"),
            },
            DISCONNECT_HOOKS_TASK => {
                match serde_json::from_value::<DisconnectHooksArgs>(task.args) {
                    Ok(args) => self.run_teardown(args).await,
                    Err(e) => tracing::error!(error = %e, "Invalid disconnect_hooks arguments"),
                }
            }
            other => tracing::warn!(task = other, "Unknown task name, dropping"),
        }
    }

    /// Run the webhook-removal task under its retry policy, then abandon
    /// with an error log. Local account state is already gone and is not
    /// rolled back.
    async fn run_teardown(&self, args: DisconnectHooksArgs) {
        let client = match GitLabClient::new(&self.gitlab, args.token.as_str()) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(user_id = args.user_id, error = %e, "Teardown client build failed");
                return;
            }
        };

        for attempt in 0..=self.teardown_retry.max_retries {
            match teardown::remove_hooks(&client, &args).await {
                Ok(()) => {
                    tracing::info!(user_id = args.user_id, "Remote webhooks removed");
                    return;
                }
                Err(e) if attempt < self.teardown_retry.max_retries => {
                    let delay = self.teardown_retry.delay_for(attempt);
                    tracing::warn!(
                        user_id = args.user_id,
                        attempt = attempt + 1,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "Webhook teardown failed, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        user_id = args.user_id,
                        error = %e,
                        "Webhook teardown failed after all retries, abandoning"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queue_delivers_tasks_in_order() {
        let (queue, mut rx) = TaskQueue::with_capacity(4);
        queue
            .enqueue("a", serde_json::json!({"n": 1}))
            .await
            .unwrap();
        queue
            .enqueue("b", serde_json::json!({"n": 2}))
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.task, "a");
        let second = rx.recv().await.unwrap();
        assert_eq!(second.task, "b");
    }

    #[tokio::test]
    async fn enqueue_fails_once_receiver_is_dropped() {
        let (queue, rx) = TaskQueue::with_capacity(4);
        drop(rx);
        let result = queue.enqueue("a", serde_json::Value::Null).await;
        assert!(matches!(result, Err(ScheduleError::QueueClosed)));
    }
}
