use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::task::api::TaskState;
use crate::task::{
    DEFAULT_PAGE_SIZE, SortDirection, SortField, Task, TaskDraft, TaskPage, TaskQuery,
    TaskServiceError, TaskStatus,
};
use crate::web::api::v1::{ApiError, ErrorResponse, ValidationErrorResponse};

/// JSON representation of a Task for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskJson {
    /// Unique identifier of the task
    pub id: i64,
    #[schema(example = "Complete Project Documentation")]
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            due_date: task.due_date,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Request body for creating or replacing a task.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    #[validate(
        required(message = "Title is required"),
        custom(function = "validate_not_blank", message = "Title is required"),
        length(max = 255, message = "Title must not exceed 255 characters")
    )]
    #[schema(example = "Complete Project Documentation", max_length = 255)]
    pub title: Option<String>,
    #[validate(length(max = 1000, message = "Description must not exceed 1000 characters"))]
    #[schema(max_length = 1000)]
    pub description: Option<String>,
    #[validate(required(message = "Status is required"))]
    pub status: Option<TaskStatus>,
    /// RFC 3339 timestamp, or `yyyy-MM-ddTHH:mm:ss` read as UTC.
    #[serde(default, deserialize_with = "deserialize_due_date")]
    #[validate(
        required(message = "Due date is required"),
        custom(function = "validate_future", message = "Due date must be in the future")
    )]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskRequest {
    /// Runs schema validation and converts the request into a [`TaskDraft`].
    pub fn into_draft(self) -> Result<TaskDraft, ApiError> {
        self.validate()?;
        match (self.title, self.status, self.due_date) {
            (Some(title), Some(status), Some(due_date)) => Ok(TaskDraft {
                title,
                description: self.description,
                status,
                due_date,
            }),
            _ => Err(ApiError::Unexpected(
                "validated task request is missing required fields".to_string(),
            )),
        }
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn validate_future(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *value <= Utc::now() {
        return Err(ValidationError::new("future"));
    }
    Ok(())
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| parse_due_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}

fn parse_due_date(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|naive| naive.and_utc())
        })
}

/// One page of tasks.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskPageJson {
    pub content: Vec<TaskJson>,
    /// Zero-based page index
    pub page: u64,
    pub size: u64,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl From<TaskPage> for TaskPageJson {
    fn from(page: TaskPage) -> Self {
        Self {
            page: page.page,
            size: page.size,
            total_elements: page.total,
            total_pages: page.total_pages(),
            first: page.is_first(),
            last: page.is_last(),
            content: page.items.into_iter().map(TaskJson::from).collect(),
        }
    }
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_sort_by() -> String {
    "createdAt".to_string()
}

fn default_sort_dir() -> String {
    "desc".to_string()
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListTasksParams {
    /// Only return tasks with this status
    pub status: Option<TaskStatus>,
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Zero-based page index
    #[serde(default)]
    #[param(default = 0)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[param(default = 10)]
    pub size: u64,
    /// One of id, title, description, status, dueDate, createdAt, updatedAt
    #[serde(default = "default_sort_by")]
    #[param(default = "createdAt")]
    pub sort_by: String,
    /// `desc` sorts descending, anything else ascending
    #[serde(default = "default_sort_dir")]
    #[param(default = "desc")]
    pub sort_dir: String,
}

impl TryFrom<ListTasksParams> for TaskQuery {
    type Error = ApiError;

    fn try_from(params: ListTasksParams) -> Result<Self, Self::Error> {
        let sort_by = params
            .sort_by
            .parse::<SortField>()
            .map_err(|err| ApiError::InvalidRequest(err.to_string()))?;
        Ok(TaskQuery {
            status: params.status,
            title: params.title,
            page: params.page,
            size: params.size,
            sort_by,
            sort_dir: SortDirection::parse_lenient(&params.sort_dir),
        })
    }
}

/// Paging parameters for listing tasks by status.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StatusPageParams {
    #[serde(default)]
    #[param(default = 0)]
    pub page: u64,
    #[serde(default = "default_page_size")]
    #[param(default = 10)]
    pub size: u64,
}

impl From<TaskServiceError> for ApiError {
    fn from(err: TaskServiceError) -> Self {
        match err {
            TaskServiceError::InvalidArgument(message) => ApiError::InvalidRequest(message),
            TaskServiceError::TaskNotFound(_) => ApiError::TaskNotFound(err.to_string()),
            TaskServiceError::Database(db_err) => ApiError::Unexpected(db_err.to_string()),
        }
    }
}

/// Handler for POST /api/v1/tasks - Creates a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = TaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Invalid task", body = ValidationErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<TaskState>>,
    WithRejection(Json(request), _): WithRejection<Json<TaskRequest>, ApiError>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let draft = request.into_draft()?;
    let task = state.service.create_task(draft).await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for GET /api/v1/tasks - Lists tasks with optional filters.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(ListTasksParams),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TaskPageJson),
        (status = 400, description = "Invalid paging or sorting", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<Arc<TaskState>>,
    WithRejection(Query(params), _): WithRejection<Query<ListTasksParams>, ApiError>,
) -> Result<Json<TaskPageJson>, ApiError> {
    let query = TaskQuery::try_from(params)?;
    let page = state.service.get_all_tasks(query).await?;
    Ok(Json(TaskPageJson::from(page)))
}

/// Handler for GET /api/v1/tasks/{id} - Returns one task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = TaskJson),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<TaskState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<Json<TaskJson>, ApiError> {
    let task = state.service.get_task_by_id(id).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for PUT /api/v1/tasks/{id} - Replaces the editable fields of a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    request_body = TaskRequest,
    responses(
        (status = 200, description = "Task updated", body = TaskJson),
        (status = 400, description = "Invalid task", body = ValidationErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<TaskState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
    WithRejection(Json(request), _): WithRejection<Json<TaskRequest>, ApiError>,
) -> Result<Json<TaskJson>, ApiError> {
    let draft = request.into_draft()?;
    let task = state.service.update_task(id, draft).await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i64, Path, description = "Task ID")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<TaskState>>,
    WithRejection(Path(id), _): WithRejection<Path<i64>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.service.delete_task(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for GET /api/v1/tasks/status/{status} - Lists tasks with one status,
/// newest first.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/status/{status}",
    params(
        ("status" = TaskStatus, Path, description = "Task status"),
        StatusPageParams
    ),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TaskPageJson),
        (status = 400, description = "Unknown status", body = ValidationErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_by_status_handler(
    State(state): State<Arc<TaskState>>,
    WithRejection(Path(status), _): WithRejection<Path<TaskStatus>, ApiError>,
    WithRejection(Query(params), _): WithRejection<Query<StatusPageParams>, ApiError>,
) -> Result<Json<TaskPageJson>, ApiError> {
    let query = TaskQuery {
        status: Some(status),
        page: params.page,
        size: params.size,
        ..TaskQuery::default()
    };
    let page = state.service.get_all_tasks(query).await?;
    Ok(Json(TaskPageJson::from(page)))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<TaskState>) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/tasks/status/{status}", get(list_tasks_by_status_handler))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MockTaskNotifier;
    use crate::task::TaskService;
    use crate::task::repository::MockTaskRepository;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use chrono::{Duration, TimeZone};
    use sea_orm::DbErr;
    use tower::ServiceExt;

    fn router(repository: MockTaskRepository, notifier: MockTaskNotifier) -> Router {
        let service = TaskService::new(Arc::new(repository), Arc::new(notifier));
        create_api_router(Arc::new(TaskState { service }))
    }

    fn quiet_notifier() -> MockTaskNotifier {
        let mut notifier = MockTaskNotifier::new();
        notifier.expect_notify_completed().never();
        notifier
    }

    fn stored_task(id: i64, status: TaskStatus) -> Task {
        let created_at = Utc::now();
        Task {
            id,
            title: "Deploy".to_string(),
            description: None,
            status,
            due_date: created_at + Duration::days(7),
            created_at,
            updated_at: created_at,
        }
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn can_parse_due_dates_with_and_without_zone() {
        let expected = Utc.with_ymd_and_hms(2030, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_due_date("2030-01-15T10:30:00Z").unwrap(), expected);
        assert_eq!(parse_due_date("2030-01-15T12:30:00+02:00").unwrap(), expected);
        assert_eq!(parse_due_date("2030-01-15T10:30:00").unwrap(), expected);
        assert!(parse_due_date("15/01/2030").is_err());
    }

    #[test]
    fn can_report_every_missing_field() {
        let request: TaskRequest = serde_json::from_str("{}").unwrap();

        let ApiError::Bind(field_errors) = request.into_draft().unwrap_err() else {
            panic!("expected bind error");
        };
        assert_eq!(field_errors["title"], "Title is required");
        assert_eq!(field_errors["status"], "Status is required");
        assert_eq!(field_errors["dueDate"], "Due date is required");
    }

    #[test]
    fn can_reject_oversized_fields() {
        let request = TaskRequest {
            title: Some("t".repeat(256)),
            description: Some("d".repeat(1001)),
            status: Some(TaskStatus::Todo),
            due_date: Some(Utc::now() + Duration::days(1)),
        };

        let ApiError::Bind(field_errors) = request.into_draft().unwrap_err() else {
            panic!("expected bind error");
        };
        assert_eq!(field_errors["title"], "Title must not exceed 255 characters");
        assert_eq!(
            field_errors["description"],
            "Description must not exceed 1000 characters"
        );
    }

    #[test]
    fn can_reject_unknown_sort_field() {
        let params = ListTasksParams {
            status: None,
            title: None,
            page: 0,
            size: 10,
            sort_by: "priority".to_string(),
            sort_dir: "desc".to_string(),
        };

        let err = TaskQuery::try_from(params).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn can_create_task_with_201() {
        let mut repository = MockTaskRepository::new();
        repository
            .expect_insert()
            .withf(|draft| draft.title == "Deploy" && draft.status == TaskStatus::Todo)
            .times(1)
            .returning(|draft| {
                let now = Utc::now();
                Ok(Task {
                    id: 1,
                    title: draft.title,
                    description: draft.description,
                    status: draft.status,
                    due_date: draft.due_date,
                    created_at: now,
                    updated_at: now,
                })
            });
        let due_date = (Utc::now() + Duration::days(7)).to_rfc3339();

        let response = router(repository, quiet_notifier())
            .oneshot(json_request(
                Method::POST,
                "/tasks",
                serde_json::json!({"title": "Deploy", "status": "TODO", "dueDate": due_date}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["id"], 1);
        assert_eq!(body["title"], "Deploy");
        assert_eq!(body["status"], "TODO");
        assert_eq!(body["createdAt"], body["updatedAt"]);
    }

    #[tokio::test]
    async fn can_reject_blank_title_with_field_errors() {
        let mut repository = MockTaskRepository::new();
        repository.expect_insert().never();
        let due_date = (Utc::now() + Duration::days(7)).to_rfc3339();

        let response = router(repository, quiet_notifier())
            .oneshot(json_request(
                Method::POST,
                "/tasks",
                serde_json::json!({"title": "  ", "status": "TODO", "dueDate": due_date}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation Failed");
        assert_eq!(body["fieldErrors"]["title"], "Title is required");
    }

    #[tokio::test]
    async fn can_reject_past_due_date_with_field_errors() {
        let mut repository = MockTaskRepository::new();
        repository.expect_insert().never();

        let response = router(repository, quiet_notifier())
            .oneshot(json_request(
                Method::POST,
                "/tasks",
                serde_json::json!({"title": "Deploy", "status": "TODO", "dueDate": "2020-01-01T00:00:00"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["fieldErrors"]["dueDate"], "Due date must be in the future");
    }

    #[tokio::test]
    async fn can_reject_malformed_json_with_400() {
        let response = router(MockTaskRepository::new(), quiet_notifier())
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/tasks")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"title\": "))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation Failed");
        assert!(body["fieldErrors"]["body"].is_string());
    }

    #[tokio::test]
    async fn can_reject_unknown_status_value() {
        let due_date = (Utc::now() + Duration::days(7)).to_rfc3339();

        let response = router(MockTaskRepository::new(), quiet_notifier())
            .oneshot(json_request(
                Method::POST,
                "/tasks",
                serde_json::json!({"title": "Deploy", "status": "DONE", "dueDate": due_date}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn can_return_404_for_missing_task() {
        let mut repository = MockTaskRepository::new();
        repository.expect_find_by_id().returning(|_| Ok(None));

        let response = router(repository, quiet_notifier())
            .oneshot(empty_request(Method::GET, "/tasks/999"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Task Not Found");
        assert_eq!(body["message"], "Task not found with id: 999");
    }

    #[tokio::test]
    async fn can_reject_non_numeric_id_with_400() {
        let response = router(MockTaskRepository::new(), quiet_notifier())
            .oneshot(empty_request(Method::GET, "/tasks/abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["fieldErrors"]["path"].is_string());
    }

    #[tokio::test]
    async fn can_update_task_and_notify_completion() {
        let mut repository = MockTaskRepository::new();
        repository
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored_task(id, TaskStatus::Todo))));
        repository.expect_update().times(1).returning(Ok);
        let mut notifier = MockTaskNotifier::new();
        notifier
            .expect_notify_completed()
            .withf(|task| task.id == 3 && task.status == TaskStatus::Completed)
            .times(1)
            .return_const(());
        let due_date = (Utc::now() + Duration::days(7)).to_rfc3339();

        let response = router(repository, notifier)
            .oneshot(json_request(
                Method::PUT,
                "/tasks/3",
                serde_json::json!({"title": "Deploy", "status": "COMPLETED", "dueDate": due_date}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "COMPLETED");
    }

    #[tokio::test]
    async fn can_delete_task_with_204() {
        let mut repository = MockTaskRepository::new();
        repository
            .expect_find_by_id()
            .returning(|id| Ok(Some(stored_task(id, TaskStatus::Todo))));
        repository.expect_delete().times(1).returning(|_| Ok(()));

        let response = router(repository, quiet_notifier())
            .oneshot(empty_request(Method::DELETE, "/tasks/4"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn can_list_tasks_with_defaults() {
        let mut repository = MockTaskRepository::new();
        repository
            .expect_query()
            .withf(|query| *query == TaskQuery::default())
            .times(1)
            .returning(|_| Ok((vec![stored_task(1, TaskStatus::Todo)], 11)));

        let response = router(repository, quiet_notifier())
            .oneshot(empty_request(Method::GET, "/tasks"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["content"].as_array().unwrap().len(), 1);
        assert_eq!(body["page"], 0);
        assert_eq!(body["size"], 10);
        assert_eq!(body["totalElements"], 11);
        assert_eq!(body["totalPages"], 2);
        assert_eq!(body["first"], true);
        assert_eq!(body["last"], false);
    }

    #[tokio::test]
    async fn can_pass_filters_and_sorting_to_query() {
        let mut repository = MockTaskRepository::new();
        repository
            .expect_query()
            .withf(|query| {
                query.status == Some(TaskStatus::InProgress)
                    && query.title.as_deref() == Some("review")
                    && query.page == 1
                    && query.size == 5
                    && query.sort_by == SortField::DueDate
                    && query.sort_dir == SortDirection::Asc
            })
            .times(1)
            .returning(|_| Ok((vec![], 0)));

        let response = router(repository, quiet_notifier())
            .oneshot(empty_request(
                Method::GET,
                "/tasks?status=IN_PROGRESS&title=review&page=1&size=5&sortBy=dueDate&sortDir=ASC",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn can_reject_unknown_sort_field_with_400() {
        let mut repository = MockTaskRepository::new();
        repository.expect_query().never();

        let response = router(repository, quiet_notifier())
            .oneshot(empty_request(Method::GET, "/tasks?sortBy=priority"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid Request");
        assert_eq!(body["message"], "Unsupported sort field: priority");
    }

    #[tokio::test]
    async fn can_reject_zero_page_size_with_400() {
        let response = router(MockTaskRepository::new(), quiet_notifier())
            .oneshot(empty_request(Method::GET, "/tasks?size=0"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Page size must not be less than one");
    }

    #[tokio::test]
    async fn can_reject_out_of_range_paging_with_400() {
        for (uri, message) in [
            (
                "/tasks?page=18446744073709551615&size=1",
                "Page index is out of range",
            ),
            (
                "/tasks?size=18446744073709551615",
                "Page size must not exceed 1000",
            ),
            (
                "/tasks/status/TODO?page=9223372036854775808&size=1",
                "Page index is out of range",
            ),
        ] {
            let mut repository = MockTaskRepository::new();
            repository.expect_query().never();

            let response = router(repository, quiet_notifier())
                .oneshot(empty_request(Method::GET, uri))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            let body = body_json(response).await;
            assert_eq!(body["error"], "Invalid Request");
            assert_eq!(body["message"], message);
        }
    }

    #[tokio::test]
    async fn can_list_tasks_by_status_newest_first() {
        let mut repository = MockTaskRepository::new();
        repository
            .expect_query()
            .withf(|query| {
                query.status == Some(TaskStatus::Completed)
                    && query.title.is_none()
                    && query.page == 0
                    && query.size == 10
                    && query.sort_by == SortField::CreatedAt
                    && query.sort_dir == SortDirection::Desc
            })
            .times(1)
            .returning(|_| Ok((vec![stored_task(2, TaskStatus::Completed)], 1)));

        let response = router(repository, quiet_notifier())
            .oneshot(empty_request(Method::GET, "/tasks/status/COMPLETED"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["content"][0]["status"], "COMPLETED");
        assert_eq!(body["last"], true);
    }

    #[tokio::test]
    async fn can_hide_database_errors_behind_500() {
        let mut repository = MockTaskRepository::new();
        repository
            .expect_find_by_id()
            .returning(|_| Err(DbErr::Custom("pool timed out".to_string())));

        let response = router(repository, quiet_notifier())
            .oneshot(empty_request(Method::GET, "/tasks/1"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert!(!body["message"].as_str().unwrap().contains("pool"));
    }
}
