use std::sync::Arc;

use crate::events::TaskNotifier;
use crate::task::validation::validate_task;
use crate::task::{Task, TaskDraft, TaskPage, TaskQuery, TaskRepository, TaskServiceError};

pub const PAGE_SIZE_TOO_SMALL: &str = "Page size must not be less than one";
pub const PAGE_SIZE_TOO_LARGE: &str = "Page size must not exceed 1000";
pub const PAGE_INDEX_TOO_LARGE: &str = "Page index is out of range";

/// Largest page a single listing may return.
pub const MAX_PAGE_SIZE: u64 = 1000;

/// Orchestrates validation, persistence and completion notifications.
pub struct TaskService {
    repository: Arc<dyn TaskRepository>,
    notifier: Arc<dyn TaskNotifier>,
}

impl TaskService {
    pub fn new(repository: Arc<dyn TaskRepository>, notifier: Arc<dyn TaskNotifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `draft` - The fields of the task to create.
    ///
    /// # Returns
    ///
    /// The persisted `Task`, or an error if validation or persistence fails.
    /// A completed task is announced to the notifier before returning.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task, TaskServiceError> {
        validate_task(&draft.title, draft.due_date)?;
        let created = self.repository.insert(draft).await?;
        self.notify_if_completed(&created).await;
        Ok(created)
    }

    /// Retrieves a task by its ID.
    ///
    /// # Returns
    ///
    /// The `Task`, or `TaskServiceError::TaskNotFound` if no task has this ID.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_by_id(&self, id: i64) -> Result<Task, TaskServiceError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TaskServiceError::TaskNotFound(id))
    }

    /// Retrieves one page of tasks matching the optional status and title filters.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_tasks(&self, query: TaskQuery) -> Result<TaskPage, TaskServiceError> {
        if query.size == 0 {
            return Err(TaskServiceError::InvalidArgument(
                PAGE_SIZE_TOO_SMALL.to_string(),
            ));
        }
        if query.size > MAX_PAGE_SIZE {
            return Err(TaskServiceError::InvalidArgument(
                PAGE_SIZE_TOO_LARGE.to_string(),
            ));
        }
        // The offset is bound as a signed 64-bit integer.
        let offset = query.page.checked_mul(query.size);
        if offset.is_none_or(|offset| i64::try_from(offset).is_err()) {
            return Err(TaskServiceError::InvalidArgument(
                PAGE_INDEX_TOO_LARGE.to_string(),
            ));
        }

        let (page, size) = (query.page, query.size);
        let (items, total) = self.repository.query(query).await?;
        Ok(TaskPage {
            items,
            total,
            page,
            size,
        })
    }

    /// Replaces the editable fields of an existing task.
    ///
    /// # Arguments
    ///
    /// * `id` - The ID of the task to update.
    /// * `draft` - The new title, description, status and due date.
    ///
    /// # Returns
    ///
    /// The updated `Task`, or an error if the task does not exist, the merged
    /// task fails validation, or persistence fails.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, id: i64, draft: TaskDraft) -> Result<Task, TaskServiceError> {
        let mut existing = self.get_task_by_id(id).await?;
        tracing::info!("Updating task with id: {}", id);

        existing.apply(draft);
        validate_task(&existing.title, existing.due_date)?;

        let updated = self.repository.update(existing).await?;
        self.notify_if_completed(&updated).await;
        Ok(updated)
    }

    /// Deletes a task by its ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: i64) -> Result<(), TaskServiceError> {
        let task = self.get_task_by_id(id).await?;
        self.repository.delete(task).await?;
        Ok(())
    }

    async fn notify_if_completed(&self, task: &Task) {
        if task.is_completed() {
            self.notifier.notify_completed(task).await;
        }
    }
}
