use chrono::{DateTime, Utc};

use crate::task::TaskServiceError;

pub const TITLE_REQUIRED: &str = "Task title is required";
pub const DUE_DATE_IN_PAST: &str = "Due date must be in the future";

/// Checks the business rules a task must satisfy before it is persisted.
///
/// Runs the same way on create and on update; on update it must be given the
/// merged record, not the incoming patch.
#[tracing::instrument]
pub fn validate_task(title: &str, due_date: DateTime<Utc>) -> Result<(), TaskServiceError> {
    validate_task_at(title, due_date, Utc::now())
}

/// Same as [`validate_task`] with an explicit notion of "now".
pub fn validate_task_at(
    title: &str,
    due_date: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TaskServiceError> {
    if due_date <= now {
        return Err(TaskServiceError::InvalidArgument(DUE_DATE_IN_PAST.to_string()));
    }

    if title.trim().is_empty() {
        return Err(TaskServiceError::InvalidArgument(TITLE_REQUIRED.to_string()));
    }

    Ok(())
}
