use std::sync::Arc;

use axum::Router;

use crate::task::api::TaskState;

pub mod v1;

/// Creates the API routes for JSON API endpoints.
pub fn create_api_router(task_state: Arc<TaskState>) -> Router {
    let tasks_router = crate::task::api::v1::create_api_router(task_state);
    Router::new().nest("/api/v1", tasks_router)
}
