//! Task management: the domain model, its validation rules, the record store
//! and the service that ties them to completion notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

pub mod api;
pub mod repository;
pub mod seed;
pub mod service;
pub mod validation;

pub use repository::{SeaOrmTaskRepository, TaskRepository};
pub use service::TaskService;

/// Default page size for task listings.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
}

impl TaskStatus {
    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Completed => "COMPLETED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Replaces every client-editable field with the values from `draft`.
    /// Identity and lifecycle timestamps are left untouched.
    pub fn apply(&mut self, draft: TaskDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.status = draft.status;
        self.due_date = draft.due_date;
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// The client-editable fields of a task, used both to create a task and to
/// replace the fields of an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
}

/// Fields a task listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Description,
    Status,
    DueDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, thiserror::Error)]
#[error("Unsupported sort field: {0}")]
pub struct UnknownSortField(String);

impl FromStr for SortField {
    type Err = UnknownSortField;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "id" => Ok(SortField::Id),
            "title" => Ok(SortField::Title),
            "description" => Ok(SortField::Description),
            "status" => Ok(SortField::Status),
            "dueDate" => Ok(SortField::DueDate),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            other => Err(UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `desc` in any letter case sorts descending; everything else ascending.
    pub fn parse_lenient(value: &str) -> Self {
        if value.eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// A filtered, sorted, 0-indexed page request over tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub title: Option<String>,
    pub page: u64,
    pub size: u64,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self {
            status: None,
            title: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort_by: SortField::CreatedAt,
            sort_dir: SortDirection::Desc,
        }
    }
}

/// One page of tasks together with the number of tasks matching the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPage {
    pub items: Vec<Task>,
    pub total: u64,
    pub page: u64,
    pub size: u64,
}

impl TaskPage {
    pub fn total_pages(&self) -> u64 {
        if self.size == 0 {
            return 0;
        }
        self.total.div_ceil(self.size)
    }

    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    pub fn is_last(&self) -> bool {
        self.page.saturating_add(1) >= self.total_pages()
    }
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// A business rule rejected the input.
    #[error("{0}")]
    InvalidArgument(String),
    /// No task exists with the given ID.
    #[error("Task not found with id: {0}")]
    TaskNotFound(i64),
    /// Represents a database error.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}
