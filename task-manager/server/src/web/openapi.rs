use utoipa::OpenApi;
use utoipa::openapi::server::Server;

use crate::task::TaskStatus;
use crate::task::api::v1::{self as tasks_v1, TaskJson, TaskPageJson, TaskRequest};
use crate::web::api::v1::{ErrorResponse, ValidationErrorResponse};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Task Management API",
        version = "1.0",
        description = "This API exposes endpoints to manage tasks in a task management system."
    ),
    paths(
        tasks_v1::create_task_handler,
        tasks_v1::list_tasks_handler,
        tasks_v1::get_task_handler,
        tasks_v1::update_task_handler,
        tasks_v1::delete_task_handler,
        tasks_v1::list_tasks_by_status_handler,
    ),
    components(schemas(
        TaskJson,
        TaskRequest,
        TaskPageJson,
        TaskStatus,
        ErrorResponse,
        ValidationErrorResponse
    )),
    tags((name = "Tasks", description = "Create, read, update and delete tasks"))
)]
pub struct ApiDoc;

/// Builds the OpenAPI document, advertising a development server on `port`.
pub fn openapi_document(port: u16) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    let mut server = Server::new(format!("http://localhost:{}", port));
    server.description = Some("Development server".to_string());
    doc.servers = Some(vec![server]);
    doc
}
