#![allow(dead_code)]

use async_trait::async_trait;
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use std::sync::{Arc, Mutex};
use task_manager_server::events::{EventBus, EventEnvelope, EventError, TaskNotifier};
use task_manager_server::task::Task;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

pub async fn setup_db(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<DatabaseConnection> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);
    let db = Database::connect(&db_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Notifier that remembers every completed task it was handed.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    completed: Arc<Mutex<Vec<Task>>>,
}

impl RecordingNotifier {
    pub fn completed(&self) -> Vec<Task> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskNotifier for RecordingNotifier {
    async fn notify_completed(&self, task: &Task) {
        self.completed.lock().unwrap().push(task.clone());
    }
}

/// Event bus that refuses every event and counts the attempts.
#[derive(Clone, Default)]
pub struct UnreachableEventBus {
    attempts: Arc<Mutex<usize>>,
}

impl UnreachableEventBus {
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl EventBus for UnreachableEventBus {
    async fn put_event(&self, _event: EventEnvelope) -> Result<(), EventError> {
        *self.attempts.lock().unwrap() += 1;
        Err(EventError::Dispatch("connection refused".to_string()))
    }
}
