use crate::comment::api::CommentJson;
use crate::task::{ExtendedTask, NewTask, Task, TaskService};
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
pub struct TaskJson {
    pub id: i32,
    pub name: String,
    pub status: bool,
    pub description: String,
    pub column_id: i32,
}

impl From<Task> for TaskJson {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            name: task.name,
            status: task.status,
            description: task.description,
            column_id: task.column_id,
        }
    }
}

/// Request body for creating or replacing a task.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TaskRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub column_id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub status: bool,
    #[serde(default)]
    pub description: String,
}

/// A task with its comments.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExtendedTaskJson {
    pub id: i32,
    pub name: String,
    pub status: bool,
    pub description: String,
    pub column_id: i32,
    pub comments: Vec<CommentJson>,
}

impl From<ExtendedTask> for ExtendedTaskJson {
    fn from(extended: ExtendedTask) -> Self {
        let task = extended.task;
        Self {
            id: task.id,
            name: task.name,
            status: task.status,
            description: task.description,
            column_id: task.column_id,
            comments: extended
                .comments
                .into_iter()
                .map(CommentJson::from)
                .collect(),
        }
    }
}

/// Handler for GET /tasks/
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/tasks/",
    responses(
        (status = 200, description = "Every task", body = Vec<TaskJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_tasks_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TaskJson>>, ApiError> {
    let service = TaskService::new(state.repo.as_ref(), state.parent_scope);
    let tasks = service.get_tasks().await?;
    Ok(Json(tasks.into_iter().map(TaskJson::from).collect()))
}

/// Handler for GET /projects/{project_id}/columns/{column_id}/tasks/
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/{project_id}/columns/{column_id}/tasks/",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID")
    ),
    responses(
        (status = 200, description = "Tasks of the column with their comments", body = Vec<ExtendedTaskJson>),
        (status = 400, description = "Malformed IDs or column of another project", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_column_tasks_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<Vec<ExtendedTaskJson>>, ApiError> {
    let Path((project_id, column_id)) = path?;
    let service = TaskService::new(state.repo.as_ref(), state.parent_scope);
    let tasks = service.get_all_by_column_id(project_id, column_id).await?;
    Ok(Json(tasks.into_iter().map(ExtendedTaskJson::from).collect()))
}

/// Handler for GET /projects/{project_id}/columns/{column_id}/tasks/{task_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "The task with its comments", body = ExtendedTaskJson),
        (status = 400, description = "Malformed IDs or task outside the path", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32)>, PathRejection>,
) -> Result<Json<ExtendedTaskJson>, ApiError> {
    let Path((project_id, column_id, task_id)) = path?;
    let service = TaskService::new(state.repo.as_ref(), state.parent_scope);
    let task = service.get_task(project_id, column_id, task_id).await?;
    Ok(Json(ExtendedTaskJson::from(task)))
}

/// Handler for POST /projects/{project_id}/columns/{column_id}/tasks/
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/projects/{project_id}/columns/{column_id}/tasks/",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID")
    ),
    request_body = TaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskJson),
        (status = 400, description = "Malformed input or column ID differs from path", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32)>, PathRejection>,
    body: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskJson>), ApiError> {
    let Path((project_id, path_column_id)) = path?;
    let Json(request) = body?;
    let column_id = resolve_id("column_id", request.column_id, path_column_id)?;

    let service = TaskService::new(state.repo.as_ref(), state.parent_scope);
    let task = service
        .create_task(
            project_id,
            NewTask {
                name: request.name,
                status: request.status,
                description: request.description,
                column_id,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(TaskJson::from(task))))
}

/// Handler for PUT /projects/{project_id}/columns/{column_id}/tasks/{task_id}
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    put,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID")
    ),
    request_body = TaskRequest,
    responses(
        (status = 200, description = "Task replaced", body = TaskJson),
        (status = 400, description = "Malformed input or IDs differ from path", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32)>, PathRejection>,
    body: Result<Json<TaskRequest>, JsonRejection>,
) -> Result<Json<TaskJson>, ApiError> {
    let Path((project_id, path_column_id, task_id)) = path?;
    let Json(request) = body?;
    let id = resolve_id("id", request.id, task_id)?;
    let column_id = resolve_id("column_id", request.column_id, path_column_id)?;

    let service = TaskService::new(state.repo.as_ref(), state.parent_scope);
    let task = service
        .update_task(
            project_id,
            Task {
                id,
                name: request.name,
                status: request.status,
                description: request.description,
                column_id,
            },
        )
        .await?;
    Ok(Json(TaskJson::from(task)))
}

/// Handler for DELETE /projects/{project_id}/columns/{column_id}/tasks/{task_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/columns/{column_id}/tasks/{task_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID"),
        ("task_id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 400, description = "Malformed IDs or task outside the path", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32, i32)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((project_id, column_id, task_id)) = path?;
    let service = TaskService::new(state.repo.as_ref(), state.parent_scope);
    service.delete_task(project_id, column_id, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tasks/", get(get_tasks_handler))
        .route(
            "/projects/{project_id}/columns/{column_id}/tasks/",
            get(get_column_tasks_handler).post(create_task_handler),
        )
        .route(
            "/projects/{project_id}/columns/{column_id}/tasks/{task_id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::comment::Comment;
    use crate::service::ParentScope;
    use crate::storage::{MockRepository, StorageError};
    use crate::web::test_support::{send, state};
    use axum::http::Method;
    use mockall::predicate::*;
    use serde_json::json;

    fn task(id: i32, column_id: i32) -> Task {
        Task {
            id,
            name: "Write docs".to_string(),
            status: false,
            description: "all of them".to_string(),
            column_id,
        }
    }

    fn expect_chain(repo: &mut MockRepository, task_column: i32, column_project: i32) {
        repo.expect_find_task()
            .returning(move |id| Ok(task(id, task_column)));
        repo.expect_find_column().returning(move |id| {
            Ok(Column {
                id,
                name: "Todo".to_string(),
                project_id: column_project,
                order_num: 0,
                status: String::new(),
            })
        });
    }

    #[tokio::test]
    async fn get_task_returns_task_with_comments() {
        let mut repo = MockRepository::new();
        expect_chain(&mut repo, 3, 1);
        repo.expect_get_task().with(eq(20)).returning(|id| {
            Ok(ExtendedTask {
                task: task(id, 3),
                comments: vec![Comment {
                    id: 7,
                    description: "looks good".to_string(),
                    task_id: id,
                }],
            })
        });
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(app, Method::GET, "/projects/1/columns/3/tasks/20", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "id": 20,
                "name": "Write docs",
                "status": false,
                "description": "all of them",
                "column_id": 3,
                "comments": [{"id": 7, "description": "looks good", "task_id": 20}]
            })
        );
    }

    #[tokio::test]
    async fn create_task_in_missing_column_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_find_column()
            .returning(|id| Err(StorageError::not_found("Column", id)));
        repo.expect_create_task().never();
        let app = create_api_router(state(repo, ParentScope::Ignore));

        let (status, body) = send(
            app,
            Method::POST,
            "/projects/1/columns/3/tasks/",
            Some(json!({"name": "Write docs"})),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Column with ID 3 not found");
    }

    #[tokio::test]
    async fn create_task_echoes_every_field() {
        let mut repo = MockRepository::new();
        expect_chain(&mut repo, 3, 1);
        repo.expect_create_task().times(1).returning(|task| {
            Ok(Task {
                id: 21,
                name: task.name,
                status: task.status,
                description: task.description,
                column_id: task.column_id,
            })
        });
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::POST,
            "/projects/1/columns/3/tasks/",
            Some(json!({"name": "Ship", "status": true, "description": "today"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({
                "id": 21,
                "name": "Ship",
                "status": true,
                "description": "today",
                "column_id": 3
            })
        );
    }

    #[tokio::test]
    async fn update_task_with_differing_id_is_rejected_before_storage() {
        let mut repo = MockRepository::new();
        repo.expect_find_task().never();
        repo.expect_update_task().never();
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::PUT,
            "/projects/1/columns/3/tasks/20",
            Some(json!({"id": 21, "name": "Write docs"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ID_MISMATCH");
    }

    #[tokio::test]
    async fn update_task_with_overlong_name_is_bad_request() {
        let mut repo = MockRepository::new();
        repo.expect_find_task().never();
        repo.expect_update_task().never();
        let app = create_api_router(state(repo, ParentScope::Ignore));

        let (status, body) = send(
            app,
            Method::PUT,
            "/projects/1/columns/3/tasks/20",
            Some(json!({"name": "t".repeat(crate::task::NAME_MAX_LEN + 1)})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn update_task_returns_stored_task() {
        let mut repo = MockRepository::new();
        expect_chain(&mut repo, 3, 1);
        repo.expect_update_task()
            .times(1)
            .returning(|task| Ok(task));
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::PUT,
            "/projects/1/columns/3/tasks/20",
            Some(json!({"name": "Write docs", "status": true})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 20);
        assert_eq!(body["status"], true);
    }

    #[tokio::test]
    async fn delete_task_outside_path_is_rejected_when_enforced() {
        let mut repo = MockRepository::new();
        expect_chain(&mut repo, 3, 2);
        repo.expect_delete_task().never();
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) =
            send(app, Method::DELETE, "/projects/1/columns/3/tasks/20", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "PARENT_MISMATCH");
    }
}
