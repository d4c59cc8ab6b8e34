use crate::column::api::ExtendedColumnJson;
use crate::project::{ExtendedProject, NewProject, Project, ProjectService};
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

/// JSON representation of a Project for API responses.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ProjectJson {
    pub id: i32,
    pub name: String,
    pub description: String,
}

impl From<Project> for ProjectJson {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            description: project.description,
        }
    }
}

/// Request body for creating or replacing a project.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectRequest {
    /// Must equal the path id when present on update; ignored on create
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A project with its columns, their tasks and the tasks' comments.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExtendedProjectJson {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub columns: Vec<ExtendedColumnJson>,
}

impl From<ExtendedProject> for ExtendedProjectJson {
    fn from(extended: ExtendedProject) -> Self {
        Self {
            id: extended.project.id,
            name: extended.project.name,
            description: extended.project.description,
            columns: extended
                .columns
                .into_iter()
                .map(ExtendedColumnJson::from)
                .collect(),
        }
    }
}

/// Handler for GET /projects/
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/",
    responses(
        (status = 200, description = "All projects, without children", body = Vec<ProjectJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_projects_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProjectJson>>, ApiError> {
    let service = ProjectService::new(state.repo.as_ref(), state.parent_scope);
    let projects = service.get_projects().await?;
    Ok(Json(projects.into_iter().map(ProjectJson::from).collect()))
}

/// Handler for GET /projects/{project_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/{project_id}",
    params(("project_id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "The project with its full hierarchy", body = ExtendedProjectJson),
        (status = 400, description = "Malformed project ID", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn get_project_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<ExtendedProjectJson>, ApiError> {
    let Path(project_id) = path?;
    let service = ProjectService::new(state.repo.as_ref(), state.parent_scope);
    let project = service.get_project(project_id).await?;
    Ok(Json(ExtendedProjectJson::from(project)))
}

/// Handler for POST /projects/
///
/// Creates the project together with its default column.
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/projects/",
    request_body = ProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectJson),
        (status = 400, description = "Malformed body or empty name", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ProjectJson>), ApiError> {
    let Json(request) = body?;
    let service = ProjectService::new(state.repo.as_ref(), state.parent_scope);
    let project = service
        .create_project(NewProject {
            name: request.name,
            description: request.description,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ProjectJson::from(project))))
}

/// Handler for PUT /projects/{project_id}
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    put,
    path = "/projects/{project_id}",
    params(("project_id" = i32, Path, description = "Project ID")),
    request_body = ProjectRequest,
    responses(
        (status = 200, description = "Project replaced", body = ProjectJson),
        (status = 400, description = "Malformed input or body ID differs from path", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn update_project_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<ProjectRequest>, JsonRejection>,
) -> Result<Json<ProjectJson>, ApiError> {
    let Path(project_id) = path?;
    let Json(request) = body?;
    let id = resolve_id("id", request.id, project_id)?;

    let service = ProjectService::new(state.repo.as_ref(), state.parent_scope);
    let project = service
        .update_project(Project {
            id,
            name: request.name,
            description: request.description,
        })
        .await?;
    Ok(Json(ProjectJson::from(project)))
}

/// Handler for DELETE /projects/{project_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/projects/{project_id}",
    params(("project_id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 400, description = "Malformed project ID", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Projects"
)]
pub async fn delete_project_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(project_id) = path?;
    let service = ProjectService::new(state.repo.as_ref(), state.parent_scope);
    service.delete_project(project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the projects API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/projects/",
            get(get_projects_handler).post(create_project_handler),
        )
        .route(
            "/projects/{project_id}",
            get(get_project_handler)
                .put(update_project_handler)
                .delete(delete_project_handler),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, ExtendedColumn};
    use crate::service::ParentScope;
    use crate::storage::{MockRepository, StorageError};
    use crate::web::test_support::{send, state};
    use axum::http::Method;
    use mockall::predicate::*;
    use serde_json::json;

    fn demo(id: i32) -> Project {
        Project {
            id,
            name: "Demo".to_string(),
            description: "d".to_string(),
        }
    }

    #[tokio::test]
    async fn create_project_returns_created_with_default_column() {
        let mut repo = MockRepository::new();
        repo.expect_create_project()
            .times(1)
            .returning(|project| {
                Ok(Project {
                    id: 1,
                    name: project.name,
                    description: project.description,
                })
            });
        repo.expect_create_column()
            .withf(|column| column.name == "Demo_default" && column.project_id == 1)
            .times(1)
            .returning(|column| {
                Ok(Column {
                    id: 1,
                    name: column.name,
                    project_id: column.project_id,
                    order_num: column.order_num,
                    status: column.status,
                })
            });
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::POST,
            "/projects/",
            Some(json!({"name": "Demo", "description": "d"})),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body, json!({"id": 1, "name": "Demo", "description": "d"}));
    }

    #[tokio::test]
    async fn get_project_returns_nested_hierarchy() {
        let mut repo = MockRepository::new();
        repo.expect_get_project().with(eq(1)).returning(|id| {
            Ok(ExtendedProject {
                project: demo(id),
                columns: vec![ExtendedColumn {
                    column: Column {
                        id: 2,
                        name: "Demo_default".to_string(),
                        project_id: id,
                        order_num: 0,
                        status: String::new(),
                    },
                    tasks: Vec::new(),
                }],
            })
        });
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(app, Method::GET, "/projects/1", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "id": 1,
                "name": "Demo",
                "description": "d",
                "columns": [{
                    "id": 2,
                    "name": "Demo_default",
                    "project_id": 1,
                    "order_number": 0,
                    "status": "",
                    "tasks": []
                }]
            })
        );
    }

    #[tokio::test]
    async fn get_project_maps_missing_project_to_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_project()
            .returning(|id| Err(StorageError::not_found("Project", id)));
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(app, Method::GET, "/projects/8", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_project_id_is_bad_request() {
        let app = create_api_router(state(MockRepository::new(), ParentScope::Enforce));

        let (status, body) = send(app, Method::GET, "/projects/abc", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_PATH");
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let app = create_api_router(state(MockRepository::new(), ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::POST,
            "/projects/",
            Some(json!({"description": "no name"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn overlong_project_name_is_bad_request() {
        let mut repo = MockRepository::new();
        repo.expect_create_project().never();
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::POST,
            "/projects/",
            Some(json!({"name": "n".repeat(crate::project::NAME_MAX_LEN + 1)})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_FAILED");
        assert_eq!(
            body["message"],
            "Validation failed: project name must be at most 500 characters, got 501"
        );
    }

    #[tokio::test]
    async fn update_with_differing_body_id_is_rejected_before_storage() {
        let mut repo = MockRepository::new();
        repo.expect_find_project().never();
        repo.expect_update_project().never();
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::PUT,
            "/projects/1",
            Some(json!({"id": 2, "name": "Demo", "description": "d"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ID_MISMATCH");
    }

    #[tokio::test]
    async fn update_without_body_id_uses_path_id() {
        let mut repo = MockRepository::new();
        repo.expect_find_project()
            .with(eq(3))
            .returning(|id| Ok(demo(id)));
        repo.expect_update_project()
            .with(eq(Project {
                id: 3,
                name: "Renamed".to_string(),
                description: String::new(),
            }))
            .times(1)
            .returning(|project| Ok(project));
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(
            app,
            Method::PUT,
            "/projects/3",
            Some(json!({"name": "Renamed"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"id": 3, "name": "Renamed", "description": ""}));
    }

    #[tokio::test]
    async fn delete_project_returns_no_content() {
        let mut repo = MockRepository::new();
        repo.expect_delete_project()
            .with(eq(3))
            .times(1)
            .returning(|_| Ok(1));
        let app = create_api_router(state(repo, ParentScope::Enforce));

        let (status, body) = send(app, Method::DELETE, "/projects/3", None).await;

        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);
    }
}
