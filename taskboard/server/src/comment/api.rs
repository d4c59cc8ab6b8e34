use crate::comment::{Comment, CommentService, NewComment, TaskPath};
use crate::web::AppState;
use crate::web::api::{ApiError, ErrorResponse, resolve_id};
use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct CommentJson {
    pub id: i32,
    pub description: String,
    pub task_id: i32,
}

impl From<Comment> for CommentJson {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            description: comment.description,
            task_id: comment.task_id,
        }
    }
}

/// Request body for creating or replacing a comment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub task_id: Option<i32>,
    pub description: String,
}

fn task_path((project_id, column_id, task_id): (i32, i32, i32)) -> TaskPath {
    TaskPath {
        project_id,
        column_id,
        task_id,
    }
}

/// Handler for GET /comments/
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/comments/",
    responses(
        (status = 200, description = "Every comment", body = Vec<CommentJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn get_comments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CommentJson>>, ApiError> {
    let service = CommentService::new(state.repo.as_ref(), state.parent_scope);
    let comments = service.get_comments().await?;
    Ok(Json(comments.into_iter().map(CommentJson::from).collect()))
}

/// Handler for GET /projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Comments of the task", body = Vec<CommentJson>),
        (status = 400, description = "Malformed IDs or task outside the path", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn get_task_comments_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32)>, PathRejection>,
) -> Result<Json<Vec<CommentJson>>, ApiError> {
    let Path(ids) = path?;
    let service = CommentService::new(state.repo.as_ref(), state.parent_scope);
    let comments = service.get_all_by_task_id(task_path(ids)).await?;
    Ok(Json(comments.into_iter().map(CommentJson::from).collect()))
}

/// Handler for GET /projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/{comment_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/{comment_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID"),
        ("comment_id" = i32, Path, description = "Comment ID")
    ),
    responses(
        (status = 200, description = "The comment", body = CommentJson),
        (status = 400, description = "Malformed IDs or comment outside the path", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn get_comment_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32, i32)>, PathRejection>,
) -> Result<Json<CommentJson>, ApiError> {
    let Path((project_id, column_id, task_id, comment_id)) = path?;
    let service = CommentService::new(state.repo.as_ref(), state.parent_scope);
    let comment = service
        .get_comment(task_path((project_id, column_id, task_id)), comment_id)
        .await?;
    Ok(Json(CommentJson::from(comment)))
}

/// Handler for POST /projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentJson),
        (status = 400, description = "Malformed input or task ID differs from path", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn create_comment_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32)>, PathRejection>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CommentJson>), ApiError> {
    let Path(ids) = path?;
    let Json(request) = body?;
    let path = task_path(ids);
    let task_id = resolve_id("task_id", request.task_id, path.task_id)?;

    let service = CommentService::new(state.repo.as_ref(), state.parent_scope);
    let comment = service
        .create_comment(
            path,
            NewComment {
                description: request.description,
                task_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(CommentJson::from(comment))))
}

/// Handler for PUT /projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/{comment_id}
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    put,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/{comment_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID"),
        ("comment_id" = i32, Path, description = "Comment ID")
    ),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment replaced", body = CommentJson),
        (status = 400, description = "Malformed input or IDs differ from path", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn update_comment_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32, i32)>, PathRejection>,
    body: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Json<CommentJson>, ApiError> {
    let Path((project_id, column_id, path_task_id, comment_id)) = path?;
    let Json(request) = body?;
    let id = resolve_id("id", request.id, comment_id)?;
    let task_id = resolve_id("task_id", request.task_id, path_task_id)?;

    let service = CommentService::new(state.repo.as_ref(), state.parent_scope);
    let comment = service
        .update_comment(
            task_path((project_id, column_id, task_id)),
            Comment {
                id,
                description: request.description,
                task_id,
            },
        )
        .await?;
    Ok(Json(CommentJson::from(comment)))
}

/// Handler for DELETE /projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/{comment_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/{comment_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID"),
        ("comment_id" = i32, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 400, description = "Malformed IDs or comment outside the path", body = ErrorResponse),
        (status = 404, description = "Comment not found", body = ErrorResponse)
    ),
    tag = "Comments"
)]
pub async fn delete_comment_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32, i32)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((project_id, column_id, task_id, comment_id)) = path?;
    let service = CommentService::new(state.repo.as_ref(), state.parent_scope);
    service
        .delete_comment(task_path((project_id, column_id, task_id)), comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the comments API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/comments/", get(get_comments_handler))
        .route(
            "/projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/",
            get(get_task_comments_handler).post(create_comment_handler),
        )
        .route(
            "/projects/{project_id}/columns/{column_id}/tasks/{task_id}/comments/{comment_id}",
            get(get_comment_handler)
                .put(update_comment_handler)
                .delete(delete_comment_handler),
        )
        .with_state(state)
}
