use std::collections::BTreeMap;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred while processing your request";
const BIND_ERROR_MESSAGE: &str = "Request validation failed";

/// Error body returned by every JSON API endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code
    #[schema(example = 404)]
    pub status: u16,
    /// Short error category
    #[schema(example = "Task Not Found")]
    pub error: String,
    /// Detailed error message
    #[schema(example = "Task not found with id: 1")]
    pub message: String,
    /// When the error occurred
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, error: &str, message: String) -> Self {
        Self {
            status: status.as_u16(),
            error: error.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// Error body for requests that could not be bound or failed schema validation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorResponse {
    #[schema(example = 400)]
    pub status: u16,
    #[schema(example = "Validation Failed")]
    pub error: String,
    #[schema(example = "Request validation failed")]
    pub message: String,
    pub timestamp: DateTime<Utc>,
    /// Message per offending field
    pub field_errors: BTreeMap<String, String>,
}

/// Errors surfaced by the JSON API, each mapped to one HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request was well-formed but broke a business rule.
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    TaskNotFound(String),
    /// The request could not be bound to its schema.
    #[error("Request validation failed: {0:?}")]
    Bind(BTreeMap<String, String>),
    /// Anything else. The detail is logged, never returned to the client.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

impl ApiError {
    pub fn bind(field: &str, message: impl Into<String>) -> Self {
        ApiError::Bind(BTreeMap::from([(field.to_string(), message.into())]))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (
                    status,
                    Json(ErrorResponse::new(status, "Invalid Request", message)),
                )
                    .into_response()
            }
            ApiError::TaskNotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (
                    status,
                    Json(ErrorResponse::new(status, "Task Not Found", message)),
                )
                    .into_response()
            }
            ApiError::Bind(field_errors) => {
                let status = StatusCode::BAD_REQUEST;
                (
                    status,
                    Json(ValidationErrorResponse {
                        status: status.as_u16(),
                        error: "Validation Failed".to_string(),
                        message: BIND_ERROR_MESSAGE.to_string(),
                        timestamp: Utc::now(),
                        field_errors,
                    }),
                )
                    .into_response()
            }
            ApiError::Unexpected(detail) => {
                tracing::error!("Unexpected error while handling request: {}", detail);
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (
                    status,
                    Json(ErrorResponse::new(
                        status,
                        "Internal Server Error",
                        UNEXPECTED_ERROR_MESSAGE.to_string(),
                    )),
                )
                    .into_response()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bind("body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bind("query", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bind("path", rejection.body_text())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors
            .field_errors()
            .into_iter()
            .map(|(field, failures)| {
                let message = failures
                    .first()
                    .and_then(|failure| failure.message.as_ref())
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                (camel_case(field.as_ref()), message)
            })
            .collect();
        ApiError::Bind(field_errors)
    }
}

/// Converts a snake_case struct field name to the camelCase name used on the wire.
fn camel_case(field: &str) -> String {
    let mut converted = String::with_capacity(field.len());
    let mut upper_next = false;
    for c in field.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            converted.extend(c.to_uppercase());
            upper_next = false;
        } else {
            converted.push(c);
        }
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[test]
    fn can_convert_field_names_to_camel_case() {
        assert_eq!(camel_case("due_date"), "dueDate");
        assert_eq!(camel_case("title"), "title");
        assert_eq!(camel_case("created_at_utc"), "createdAtUtc");
    }

    #[tokio::test]
    async fn can_render_not_found_as_404() {
        let response =
            ApiError::TaskNotFound("Task not found with id: 9".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Task Not Found");
        assert_eq!(body["message"], "Task not found with id: 9");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn can_render_bind_errors_with_field_map() {
        let response = ApiError::bind("title", "Title is required").into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation Failed");
        assert_eq!(body["message"], "Request validation failed");
        assert_eq!(body["fieldErrors"]["title"], "Title is required");
    }

    #[tokio::test]
    async fn can_hide_unexpected_error_details() {
        let response =
            ApiError::Unexpected("connection refused by 10.0.0.4".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(
            body["message"],
            "An unexpected error occurred while processing your request"
        );
    }
}
