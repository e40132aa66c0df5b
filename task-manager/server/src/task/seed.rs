use chrono::{DateTime, Duration, Utc};
use sea_orm::DbErr;

use crate::task::{TaskDraft, TaskRepository, TaskStatus};

const SAMPLE_TASKS: [(&str, &str, TaskStatus, i64); 5] = [
    (
        "Complete Project Documentation",
        "Write comprehensive documentation for the task manager project",
        TaskStatus::Todo,
        5,
    ),
    (
        "Review Code Changes",
        "Review and approve pending pull requests",
        TaskStatus::InProgress,
        2,
    ),
    (
        "Deploy to Production",
        "Deploy the latest version to production environment",
        TaskStatus::Todo,
        7,
    ),
    (
        "Setup CI/CD Pipeline",
        "Configure continuous integration and deployment",
        TaskStatus::Completed,
        10,
    ),
    (
        "Database Migration",
        "Migrate database schema to latest version",
        TaskStatus::InProgress,
        3,
    ),
];

/// Drafts for the sample tasks, due relative to `now`.
pub fn sample_drafts(now: DateTime<Utc>) -> Vec<TaskDraft> {
    SAMPLE_TASKS
        .iter()
        .map(|&(title, description, status, due_in_days)| TaskDraft {
            title: title.to_string(),
            description: Some(description.to_string()),
            status,
            due_date: now + Duration::days(due_in_days),
        })
        .collect()
}

/// Inserts the sample tasks when the store is empty.
///
/// Writes go straight to the repository, so no completion events are emitted.
///
/// # Returns
///
/// The number of tasks inserted, zero if the store already held data.
#[tracing::instrument(skip(repository))]
pub async fn load_sample_tasks(repository: &dyn TaskRepository) -> Result<usize, DbErr> {
    if repository.count().await? > 0 {
        tracing::debug!("Tasks already present, skipping sample data");
        return Ok(0);
    }

    let drafts = sample_drafts(Utc::now());
    let inserted = drafts.len();
    for draft in drafts {
        repository.insert(draft).await?;
    }
    tracing::info!("Loaded {} sample tasks", inserted);
    Ok(inserted)
}
