use crate::column::{Column, ColumnService, ExtendedColumn, NewColumn};
use crate::task::api::ExtendedTaskJson;
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
pub struct ColumnJson {
    pub id: i32,
    pub name: String,
    pub project_id: i32,
    #[serde(rename = "order_number", alias = "order_num")]
    pub order_num: i32,
    pub status: String,
}

impl From<Column> for ColumnJson {
    fn from(column: Column) -> Self {
        Self {
            id: column.id,
            name: column.name,
            project_id: column.project_id,
            order_num: column.order_num,
            status: column.status,
        }
    }
}

/// Request body for creating or replacing a column.
///
/// `id` and `project_id` default to the path values.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ColumnRequest {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub project_id: Option<i32>,
    pub name: String,
    #[serde(default, rename = "order_number", alias = "order_num")]
    pub order_num: i32,
    #[serde(default)]
    pub status: String,
}

/// A column with its tasks and their comments.
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct ExtendedColumnJson {
    pub id: i32,
    pub name: String,
    pub project_id: i32,
    #[serde(rename = "order_number")]
    pub order_num: i32,
    pub status: String,
    pub tasks: Vec<ExtendedTaskJson>,
}

impl From<ExtendedColumn> for ExtendedColumnJson {
    fn from(extended: ExtendedColumn) -> Self {
        let column = extended.column;
        Self {
            id: column.id,
            name: column.name,
            project_id: column.project_id,
            order_num: column.order_num,
            status: column.status,
            tasks: extended
                .tasks
                .into_iter()
                .map(ExtendedTaskJson::from)
                .collect(),
        }
    }
}

/// Handler for GET /columns/
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/columns/",
    responses(
        (status = 200, description = "Every column of every project", body = Vec<ColumnJson>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Columns"
)]
pub async fn get_columns_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ColumnJson>>, ApiError> {
    let service = ColumnService::new(state.repo.as_ref(), state.parent_scope);
    let columns = service.get_columns().await?;
    Ok(Json(columns.into_iter().map(ColumnJson::from).collect()))
}

/// Handler for GET /projects/{project_id}/columns/
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/{project_id}/columns/",
    params(("project_id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Columns of the project with their tasks", body = Vec<ExtendedColumnJson>),
        (status = 400, description = "Malformed project ID", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Columns"
)]
pub async fn get_project_columns_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
) -> Result<Json<Vec<ExtendedColumnJson>>, ApiError> {
    let Path(project_id) = path?;
    let service = ColumnService::new(state.repo.as_ref(), state.parent_scope);
    let columns = service.get_all_by_project_id(project_id).await?;
    Ok(Json(
        columns.into_iter().map(ExtendedColumnJson::from).collect(),
    ))
}

/// Handler for GET /projects/{project_id}/columns/{column_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/projects/{project_id}/columns/{column_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID")
    ),
    responses(
        (status = 200, description = "The column with its tasks", body = ExtendedColumnJson),
        (status = 400, description = "Malformed IDs or column of another project", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    ),
    tag = "Columns"
)]
pub async fn get_column_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<Json<ExtendedColumnJson>, ApiError> {
    let Path((project_id, column_id)) = path?;
    let service = ColumnService::new(state.repo.as_ref(), state.parent_scope);
    let column = service.get_project_column(project_id, column_id).await?;
    Ok(Json(ExtendedColumnJson::from(column)))
}

/// Handler for POST /projects/{project_id}/columns/
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    post,
    path = "/projects/{project_id}/columns/",
    params(("project_id" = i32, Path, description = "Project ID")),
    request_body = ColumnRequest,
    responses(
        (status = 201, description = "Column created", body = ColumnJson),
        (status = 400, description = "Malformed input or project ID differs from path", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "Columns"
)]
pub async fn create_column_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<ColumnRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ColumnJson>), ApiError> {
    let Path(path_project_id) = path?;
    let Json(request) = body?;
    let project_id = resolve_id("project_id", request.project_id, path_project_id)?;

    let service = ColumnService::new(state.repo.as_ref(), state.parent_scope);
    let column = service
        .create_column(NewColumn {
            name: request.name,
            project_id,
            order_num: request.order_num,
            status: request.status,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(ColumnJson::from(column))))
}

/// Handler for PUT /projects/{project_id}/columns/{column_id}
#[tracing::instrument(skip(state, body))]
#[utoipa::path(
    put,
    path = "/projects/{project_id}/columns/{column_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID")
    ),
    request_body = ColumnRequest,
    responses(
        (status = 200, description = "Column replaced", body = ColumnJson),
        (status = 400, description = "Malformed input or IDs differ from path", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    ),
    tag = "Columns"
)]
pub async fn update_column_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32)>, PathRejection>,
    body: Result<Json<ColumnRequest>, JsonRejection>,
) -> Result<Json<ColumnJson>, ApiError> {
    let Path((path_project_id, column_id)) = path?;
    let Json(request) = body?;
    let id = resolve_id("id", request.id, column_id)?;
    let project_id = resolve_id("project_id", request.project_id, path_project_id)?;

    let service = ColumnService::new(state.repo.as_ref(), state.parent_scope);
    let column = service
        .update_column(Column {
            id,
            name: request.name,
            project_id,
            order_num: request.order_num,
            status: request.status,
        })
        .await?;
    Ok(Json(ColumnJson::from(column)))
}

/// Handler for DELETE /projects/{project_id}/columns/{column_id}
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/projects/{project_id}/columns/{column_id}",
    params(
        ("project_id" = i32, Path, description = "Project ID"),
        ("column_id" = i32, Path, description = "Column ID")
    ),
    responses(
        (status = 204, description = "Column deleted"),
        (status = 400, description = "Malformed IDs or column of another project", body = ErrorResponse),
        (status = 404, description = "Column not found", body = ErrorResponse)
    ),
    tag = "Columns"
)]
pub async fn delete_column_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<(i32, i32)>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path((project_id, column_id)) = path?;
    let service = ColumnService::new(state.repo.as_ref(), state.parent_scope);
    service.delete_column(project_id, column_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates and returns the columns API router.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/columns/", get(get_columns_handler))
        .route(
            "/projects/{project_id}/columns/",
            get(get_project_columns_handler).post(create_column_handler),
        )
        .route(
            "/projects/{project_id}/columns/{column_id}",
            get(get_column_handler)
                .put(update_column_handler)
                .delete(delete_column_handler),
        )
        .with_state(state)
}
