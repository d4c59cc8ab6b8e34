//! Shared pieces of the JSON API: error responses, request helpers and the
//! OpenAPI document.

use crate::service::ServiceError;
use crate::storage::StorageError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

/// JSON response for API errors
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Error type for API handlers.
///
/// Input errors and parent mismatches are reported as 400, missing entities
/// as 404 and datastore failures as 500.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A path segment could not be parsed into an id.
    #[error("Invalid path parameters: {0}")]
    InvalidPath(String),
    /// The request body could not be decoded.
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    /// An id in the body disagrees with the same id in the path.
    #[error("{field} {body} in the request body does not match {field} {path} in the path")]
    IdMismatch {
        field: &'static str,
        body: i32,
        path: i32,
    },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidPath(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidPath(_) => (StatusCode::BAD_REQUEST, "INVALID_PATH"),
            ApiError::InvalidBody(_) => (StatusCode::BAD_REQUEST, "INVALID_BODY"),
            ApiError::IdMismatch { .. } => (StatusCode::BAD_REQUEST, "ID_MISMATCH"),
            ApiError::Service(ServiceError::ParentMismatch { .. }) => {
                (StatusCode::BAD_REQUEST, "PARENT_MISMATCH")
            }
            ApiError::Service(ServiceError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_FAILED")
            }
            ApiError::Service(ServiceError::Storage(StorageError::NotFound { .. })) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND")
            }
            ApiError::Service(ServiceError::Storage(StorageError::Database(_))) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_code();
        let message = if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
            "An unexpected error occurred while processing your request. Please try again later."
                .to_string()
        } else {
            tracing::warn!("Request rejected: {}", self);
            self.to_string()
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

/// Reconciles an optional id from a request body with the id in the path.
///
/// A missing body id takes the path value; a differing one is rejected.
pub fn resolve_id(field: &'static str, body: Option<i32>, path: i32) -> Result<i32, ApiError> {
    match body {
        Some(body) if body != path => Err(ApiError::IdMismatch { field, body, path }),
        _ => Ok(path),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::project::api::get_projects_handler,
        crate::project::api::get_project_handler,
        crate::project::api::create_project_handler,
        crate::project::api::update_project_handler,
        crate::project::api::delete_project_handler,
        crate::column::api::get_columns_handler,
        crate::column::api::get_project_columns_handler,
        crate::column::api::get_column_handler,
        crate::column::api::create_column_handler,
        crate::column::api::update_column_handler,
        crate::column::api::delete_column_handler,
        crate::task::api::get_tasks_handler,
        crate::task::api::get_column_tasks_handler,
        crate::task::api::get_task_handler,
        crate::task::api::create_task_handler,
        crate::task::api::update_task_handler,
        crate::task::api::delete_task_handler,
        crate::comment::api::get_comments_handler,
        crate::comment::api::get_task_comments_handler,
        crate::comment::api::get_comment_handler,
        crate::comment::api::create_comment_handler,
        crate::comment::api::update_comment_handler,
        crate::comment::api::delete_comment_handler,
    ),
    components(schemas(ErrorResponse)),
    tags(
        (name = "Projects", description = "Projects and their full hierarchy"),
        (name = "Columns", description = "Columns of a project"),
        (name = "Tasks", description = "Tasks of a column"),
        (name = "Comments", description = "Comments on a task"),
    )
)]
pub struct ApiDoc;

/// Handler for GET /api-docs/openapi.json
#[tracing::instrument]
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
