use crate::task::TaskService;

pub mod v1;

/// Shared state for the task API handlers.
pub struct TaskState {
    pub service: TaskService,
}
