//! Completion notifications.
//!
//! When a task reaches `COMPLETED` the service hands it to a [`TaskNotifier`].
//! The production notifier serializes the task into a "Task Completed" event
//! and puts it on an [`EventBus`]. Delivery is best effort: a failed dispatch
//! is logged and dropped, never surfaced to the request that triggered it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{Task, TaskStatus};

pub mod eventbridge;

pub use eventbridge::EventBridgeBus;

/// Source stamped on every event this service emits.
pub const EVENT_SOURCE: &str = "task.manager";
/// Detail type of the event emitted when a task is completed.
pub const TASK_COMPLETED_DETAIL_TYPE: &str = "Task Completed";

/// Errors that can occur while dispatching an event.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// The event detail could not be serialized.
    #[error("Failed to serialize event detail: {0}")]
    Serialization(#[from] serde_json::Error),
    /// The request never reached the bus or the bus call itself failed.
    #[error("Failed to dispatch event: {0}")]
    Dispatch(String),
    /// The bus accepted the call but rejected the entry.
    #[error("Event bus rejected {failed} entries: {reason}")]
    Rejected { failed: i32, reason: String },
}

/// The payload of a "Task Completed" event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletedDetail {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Task> for TaskCompletedDetail {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// A single event ready to be put on a bus.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub source: String,
    pub detail_type: String,
    /// JSON-encoded event detail.
    pub detail: String,
    pub time: DateTime<Utc>,
}

impl EventEnvelope {
    /// Builds the "Task Completed" event for `task`, stamped with `time`.
    pub fn task_completed(task: &Task, time: DateTime<Utc>) -> Result<Self, EventError> {
        let detail = serde_json::to_string(&TaskCompletedDetail::from(task))?;
        Ok(Self {
            source: EVENT_SOURCE.to_string(),
            detail_type: TASK_COMPLETED_DETAIL_TYPE.to_string(),
            detail,
            time,
        })
    }
}

/// Transport that delivers events to an external bus.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn put_event(&self, event: EventEnvelope) -> Result<(), EventError>;
}

/// Receives tasks that have just been completed.
///
/// Implementations must not fail outward: anything that goes wrong is
/// recorded and swallowed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskNotifier: Send + Sync {
    async fn notify_completed(&self, task: &Task);
}

/// Notifier that publishes a "Task Completed" event on an [`EventBus`].
pub struct EventBusNotifier<B> {
    bus: B,
}

impl<B: EventBus> EventBusNotifier<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    async fn publish(&self, task: &Task) -> Result<(), EventError> {
        let event = EventEnvelope::task_completed(task, Utc::now())?;
        self.bus.put_event(event).await
    }
}

#[async_trait]
impl<B: EventBus> TaskNotifier for EventBusNotifier<B> {
    #[tracing::instrument(skip(self, task), fields(task_id = task.id))]
    async fn notify_completed(&self, task: &Task) {
        match self.publish(task).await {
            Ok(()) => tracing::info!("Task completed event sent for task {}", task.id),
            Err(err) => {
                tracing::error!(
                    "Failed to send task completed event for task {}: {}",
                    task.id,
                    err
                )
            }
        }
    }
}

/// Notifier used when event delivery is switched off; only logs.
#[derive(Clone, Debug, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl TaskNotifier for LoggingNotifier {
    async fn notify_completed(&self, task: &Task) {
        tracing::info!(
            "Task {} completed; event delivery is disabled, skipping dispatch",
            task.id
        );
    }
}
