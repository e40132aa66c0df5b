use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::*;

use crate::entities::task;
use crate::task::{SortDirection, SortField, Task, TaskDraft, TaskQuery, TaskStatus};

/// Persistence operations for tasks.
///
/// The store owns lifecycle timestamps: `insert` stamps `created_at` and
/// `updated_at`, `update` refreshes `updated_at` only.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persists a new task, assigning its ID and timestamps.
    async fn insert(&self, draft: TaskDraft) -> Result<Task, DbErr>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, DbErr>;

    /// Writes the editable fields of an existing task and refreshes `updated_at`.
    async fn update(&self, task: Task) -> Result<Task, DbErr>;

    async fn delete(&self, task: Task) -> Result<(), DbErr>;

    /// Returns the requested page of matching tasks and the total number of matches.
    async fn query(&self, query: TaskQuery) -> Result<(Vec<Task>, u64), DbErr>;

    async fn count(&self) -> Result<u64, DbErr>;
}

impl From<task::Status> for TaskStatus {
    fn from(status: task::Status) -> Self {
        match status {
            task::Status::Todo => TaskStatus::Todo,
            task::Status::InProgress => TaskStatus::InProgress,
            task::Status::Completed => TaskStatus::Completed,
        }
    }
}

impl From<TaskStatus> for task::Status {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Todo => task::Status::Todo,
            TaskStatus::InProgress => task::Status::InProgress,
            TaskStatus::Completed => task::Status::Completed,
        }
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task {
            id: model.id,
            title: model.title,
            description: model.description,
            status: model.status.into(),
            due_date: model.due_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn sort_column(field: SortField) -> task::Column {
    match field {
        SortField::Id => task::Column::Id,
        SortField::Title => task::Column::Title,
        SortField::Description => task::Column::Description,
        SortField::Status => task::Column::Status,
        SortField::DueDate => task::Column::DueDate,
        SortField::CreatedAt => task::Column::CreatedAt,
        SortField::UpdatedAt => task::Column::UpdatedAt,
    }
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// [`TaskRepository`] backed by a SeaORM database connection.
#[derive(Clone, Debug)]
pub struct SeaOrmTaskRepository {
    db: DatabaseConnection,
}

impl SeaOrmTaskRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskRepository for SeaOrmTaskRepository {
    #[tracing::instrument(skip(self))]
    async fn insert(&self, draft: TaskDraft) -> Result<Task, DbErr> {
        let now = Utc::now();
        let active_model = task::ActiveModel {
            title: ActiveValue::Set(draft.title),
            description: ActiveValue::Set(draft.description),
            status: ActiveValue::Set(draft.status.into()),
            due_date: ActiveValue::Set(draft.due_date),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, id: i64) -> Result<Option<Task>, DbErr> {
        let model = task::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Task::from))
    }

    #[tracing::instrument(skip(self))]
    async fn update(&self, changed: Task) -> Result<Task, DbErr> {
        let active_model = task::ActiveModel {
            id: ActiveValue::Unchanged(changed.id),
            title: ActiveValue::Set(changed.title),
            description: ActiveValue::Set(changed.description),
            status: ActiveValue::Set(changed.status.into()),
            due_date: ActiveValue::Set(changed.due_date),
            updated_at: ActiveValue::Set(Utc::now()),
            ..Default::default()
        };
        let updated_model = active_model.update(&self.db).await?;
        Ok(Task::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, removed: Task) -> Result<(), DbErr> {
        task::Entity::delete_by_id(removed.id).exec(&self.db).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn query(&self, query: TaskQuery) -> Result<(Vec<Task>, u64), DbErr> {
        let mut select = task::Entity::find();

        if let Some(status) = query.status {
            select = select.filter(task::Column::Status.eq(task::Status::from(status)));
        }

        if let Some(title) = query.title.as_deref() {
            // ILIKE folds case on both sides in the database.
            let pattern = format!("%{}%", escape_like(title));
            select = select.filter(
                Expr::col((task::Entity, task::Column::Title))
                    .ilike(LikeExpr::new(pattern).escape('\\')),
            );
        }

        let order = match query.sort_dir {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        };
        // Tie-break on the primary key so pages are stable across requests.
        let select = select
            .order_by(sort_column(query.sort_by), order.clone())
            .order_by(task::Column::Id, order);

        let paginator = select.paginate(&self.db, query.size);
        let total = paginator.num_items().await?;
        let tasks = paginator
            .fetch_page(query.page)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok((tasks, total))
    }

    #[tracing::instrument(skip(self))]
    async fn count(&self) -> Result<u64, DbErr> {
        task::Entity::find().count(&self.db).await
    }
}
