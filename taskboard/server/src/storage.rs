//! Persistence for the board hierarchy.
//!
//! The [`Repository`] trait is the storage contract the use-case layer is
//! written against: one create/read/update/delete set per entity plus the
//! "extended" reads that assemble an entity together with all of its
//! descendants. [`SeaOrmRepository`] implements it on top of a `SeaORM`
//! connection.

use crate::column::{Column, ExtendedColumn, NewColumn};
use crate::comment::{Comment, NewComment};
use crate::entities::{column, comment, project, task};
use crate::project::{ExtendedProject, NewProject, Project};
use crate::task::{ExtendedTask, NewTask, Task};
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder,
};
use std::collections::HashMap;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested row does not exist.
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i32 },
    /// Any failure reported by the underlying datastore.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        StorageError::NotFound { entity, id }
    }
}

/// Storage operations for projects, columns, tasks and comments.
///
/// `get_project`, `get_column` and `get_task` return extended views holding
/// the full transitive closure of children. The `find_*` methods return the
/// bare row. Updates replace the whole row and fail with
/// [`StorageError::NotFound`] when it does not exist. Deletes are hard
/// deletes that never touch children; when a parent id is supplied the row
/// is only removed if it still belongs to that parent. They return the
/// number of rows removed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    async fn get_projects(&self) -> Result<Vec<Project>, StorageError>;
    async fn get_project(&self, id: i32) -> Result<ExtendedProject, StorageError>;
    async fn find_project(&self, id: i32) -> Result<Project, StorageError>;
    async fn create_project(&self, project: NewProject) -> Result<Project, StorageError>;
    async fn update_project(&self, project: Project) -> Result<Project, StorageError>;
    async fn delete_project(&self, id: i32) -> Result<u64, StorageError>;

    async fn get_columns(&self) -> Result<Vec<Column>, StorageError>;
    async fn get_column(&self, id: i32) -> Result<ExtendedColumn, StorageError>;
    async fn find_column(&self, id: i32) -> Result<Column, StorageError>;
    async fn create_column(&self, column: NewColumn) -> Result<Column, StorageError>;
    async fn update_column(&self, column: Column) -> Result<Column, StorageError>;
    async fn delete_column(
        &self,
        column_id: i32,
        project_id: Option<i32>,
    ) -> Result<u64, StorageError>;

    async fn get_tasks(&self) -> Result<Vec<Task>, StorageError>;
    async fn get_task(&self, id: i32) -> Result<ExtendedTask, StorageError>;
    async fn find_task(&self, id: i32) -> Result<Task, StorageError>;
    async fn create_task(&self, task: NewTask) -> Result<Task, StorageError>;
    async fn update_task(&self, task: Task) -> Result<Task, StorageError>;
    async fn delete_task(
        &self,
        task_id: i32,
        column_id: Option<i32>,
    ) -> Result<u64, StorageError>;

    async fn get_comments(&self) -> Result<Vec<Comment>, StorageError>;
    async fn get_comment(&self, id: i32) -> Result<Comment, StorageError>;
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StorageError>;
    async fn update_comment(&self, comment: Comment) -> Result<Comment, StorageError>;
    async fn delete_comment(
        &self,
        comment_id: i32,
        task_id: Option<i32>,
    ) -> Result<u64, StorageError>;
}

impl From<project::Model> for Project {
    fn from(model: project::Model) -> Self {
        Project {
            id: model.id,
            name: model.name,
            description: model.description,
        }
    }
}

impl From<column::Model> for Column {
    fn from(model: column::Model) -> Self {
        Column {
            id: model.id,
            name: model.name,
            project_id: model.project_id,
            order_num: model.order_number,
            status: model.status,
        }
    }
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Task {
            id: model.id,
            name: model.name,
            status: model.status,
            description: model.description,
            column_id: model.column_id,
        }
    }
}

impl From<comment::Model> for Comment {
    fn from(model: comment::Model) -> Self {
        Comment {
            id: model.id,
            description: model.description,
            task_id: model.task_id,
        }
    }
}

/// Maps the error `SeaORM` reports for an update that matched no row.
fn update_error(err: DbErr, entity: &'static str, id: i32) -> StorageError {
    match err {
        DbErr::RecordNotUpdated => StorageError::not_found(entity, id),
        other => StorageError::Database(other),
    }
}

/// [`Repository`] backed by a relational database through `SeaORM`.
///
/// Extended reads issue one query per level of the hierarchy rather than one
/// per row: the children of every parent on a level are fetched together and
/// grouped in memory. Rows at each level are returned in id order.
#[derive(Clone, Debug)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn extend_tasks(&self, tasks: Vec<task::Model>) -> Result<Vec<ExtendedTask>, DbErr> {
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let task_ids: Vec<i32> = tasks.iter().map(|task| task.id).collect();
        let mut comments_by_task: HashMap<i32, Vec<Comment>> = HashMap::new();
        for model in comment::Entity::find()
            .filter(comment::Column::TaskId.is_in(task_ids))
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await?
        {
            comments_by_task
                .entry(model.task_id)
                .or_default()
                .push(Comment::from(model));
        }

        Ok(tasks
            .into_iter()
            .map(|model| {
                let comments = comments_by_task.remove(&model.id).unwrap_or_default();
                ExtendedTask {
                    task: Task::from(model),
                    comments,
                }
            })
            .collect())
    }

    async fn extend_columns(
        &self,
        columns: Vec<column::Model>,
    ) -> Result<Vec<ExtendedColumn>, DbErr> {
        if columns.is_empty() {
            return Ok(Vec::new());
        }
        let column_ids: Vec<i32> = columns.iter().map(|column| column.id).collect();
        let tasks = task::Entity::find()
            .filter(task::Column::ColumnId.is_in(column_ids))
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?;

        let mut tasks_by_column: HashMap<i32, Vec<ExtendedTask>> = HashMap::new();
        for extended in self.extend_tasks(tasks).await? {
            tasks_by_column
                .entry(extended.task.column_id)
                .or_default()
                .push(extended);
        }

        Ok(columns
            .into_iter()
            .map(|model| {
                let tasks = tasks_by_column.remove(&model.id).unwrap_or_default();
                ExtendedColumn {
                    column: Column::from(model),
                    tasks,
                }
            })
            .collect())
    }
}

#[async_trait]
impl Repository for SeaOrmRepository {
    #[tracing::instrument(skip(self))]
    async fn get_projects(&self) -> Result<Vec<Project>, StorageError> {
        let projects = project::Entity::find()
            .order_by_asc(project::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Project::from)
            .collect();
        Ok(projects)
    }

    #[tracing::instrument(skip(self))]
    async fn get_project(&self, id: i32) -> Result<ExtendedProject, StorageError> {
        let project = self.find_project(id).await?;
        let columns = column::Entity::find()
            .filter(column::Column::ProjectId.eq(id))
            .order_by_asc(column::Column::Id)
            .all(&self.db)
            .await?;
        let columns = self.extend_columns(columns).await?;
        Ok(ExtendedProject { project, columns })
    }

    #[tracing::instrument(skip(self))]
    async fn find_project(&self, id: i32) -> Result<Project, StorageError> {
        project::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Project::from)
            .ok_or_else(|| StorageError::not_found("Project", id))
    }

    #[tracing::instrument(skip(self))]
    async fn create_project(&self, project: NewProject) -> Result<Project, StorageError> {
        let active_model = project::ActiveModel {
            name: ActiveValue::Set(project.name),
            description: ActiveValue::Set(project.description),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Project::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn update_project(&self, project: Project) -> Result<Project, StorageError> {
        let id = project.id;
        let active_model = project::ActiveModel {
            id: ActiveValue::Unchanged(id),
            name: ActiveValue::Set(project.name),
            description: ActiveValue::Set(project.description),
        };
        let updated_model = active_model
            .update(&self.db)
            .await
            .map_err(|err| update_error(err, "Project", id))?;
        Ok(Project::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_project(&self, id: i32) -> Result<u64, StorageError> {
        let result = project::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    #[tracing::instrument(skip(self))]
    async fn get_columns(&self) -> Result<Vec<Column>, StorageError> {
        let columns = column::Entity::find()
            .order_by_asc(column::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Column::from)
            .collect();
        Ok(columns)
    }

    #[tracing::instrument(skip(self))]
    async fn get_column(&self, id: i32) -> Result<ExtendedColumn, StorageError> {
        let model = column::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StorageError::not_found("Column", id))?;
        let mut extended = self.extend_columns(vec![model]).await?;
        extended
            .pop()
            .ok_or_else(|| StorageError::not_found("Column", id))
    }

    #[tracing::instrument(skip(self))]
    async fn find_column(&self, id: i32) -> Result<Column, StorageError> {
        column::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Column::from)
            .ok_or_else(|| StorageError::not_found("Column", id))
    }

    #[tracing::instrument(skip(self))]
    async fn create_column(&self, column: NewColumn) -> Result<Column, StorageError> {
        let active_model = column::ActiveModel {
            name: ActiveValue::Set(column.name),
            project_id: ActiveValue::Set(column.project_id),
            order_number: ActiveValue::Set(column.order_num),
            status: ActiveValue::Set(column.status),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Column::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn update_column(&self, column: Column) -> Result<Column, StorageError> {
        let id = column.id;
        let active_model = column::ActiveModel {
            id: ActiveValue::Unchanged(id),
            name: ActiveValue::Set(column.name),
            project_id: ActiveValue::Set(column.project_id),
            order_number: ActiveValue::Set(column.order_num),
            status: ActiveValue::Set(column.status),
        };
        let updated_model = active_model
            .update(&self.db)
            .await
            .map_err(|err| update_error(err, "Column", id))?;
        Ok(Column::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_column(
        &self,
        column_id: i32,
        project_id: Option<i32>,
    ) -> Result<u64, StorageError> {
        let mut query = column::Entity::delete_many().filter(column::Column::Id.eq(column_id));
        if let Some(project_id) = project_id {
            query = query.filter(column::Column::ProjectId.eq(project_id));
        }
        let result = query.exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    #[tracing::instrument(skip(self))]
    async fn get_tasks(&self) -> Result<Vec<Task>, StorageError> {
        let tasks = task::Entity::find()
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn get_task(&self, id: i32) -> Result<ExtendedTask, StorageError> {
        let model = task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| StorageError::not_found("Task", id))?;
        let mut extended = self.extend_tasks(vec![model]).await?;
        extended.pop().ok_or_else(|| StorageError::not_found("Task", id))
    }

    #[tracing::instrument(skip(self))]
    async fn find_task(&self, id: i32) -> Result<Task, StorageError> {
        task::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Task::from)
            .ok_or_else(|| StorageError::not_found("Task", id))
    }

    #[tracing::instrument(skip(self))]
    async fn create_task(&self, task: NewTask) -> Result<Task, StorageError> {
        let active_model = task::ActiveModel {
            name: ActiveValue::Set(task.name),
            status: ActiveValue::Set(task.status),
            description: ActiveValue::Set(task.description),
            column_id: ActiveValue::Set(task.column_id),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn update_task(&self, task: Task) -> Result<Task, StorageError> {
        let id = task.id;
        let active_model = task::ActiveModel {
            id: ActiveValue::Unchanged(id),
            name: ActiveValue::Set(task.name),
            status: ActiveValue::Set(task.status),
            description: ActiveValue::Set(task.description),
            column_id: ActiveValue::Set(task.column_id),
        };
        let updated_model = active_model
            .update(&self.db)
            .await
            .map_err(|err| update_error(err, "Task", id))?;
        Ok(Task::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_task(
        &self,
        task_id: i32,
        column_id: Option<i32>,
    ) -> Result<u64, StorageError> {
        let mut query = task::Entity::delete_many().filter(task::Column::Id.eq(task_id));
        if let Some(column_id) = column_id {
            query = query.filter(task::Column::ColumnId.eq(column_id));
        }
        let result = query.exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    #[tracing::instrument(skip(self))]
    async fn get_comments(&self) -> Result<Vec<Comment>, StorageError> {
        let comments = comment::Entity::find()
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Comment::from)
            .collect();
        Ok(comments)
    }

    #[tracing::instrument(skip(self))]
    async fn get_comment(&self, id: i32) -> Result<Comment, StorageError> {
        comment::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Comment::from)
            .ok_or_else(|| StorageError::not_found("Comment", id))
    }

    #[tracing::instrument(skip(self))]
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, StorageError> {
        let active_model = comment::ActiveModel {
            description: ActiveValue::Set(comment.description),
            task_id: ActiveValue::Set(comment.task_id),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Comment::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn update_comment(&self, comment: Comment) -> Result<Comment, StorageError> {
        let id = comment.id;
        let active_model = comment::ActiveModel {
            id: ActiveValue::Unchanged(id),
            description: ActiveValue::Set(comment.description),
            task_id: ActiveValue::Set(comment.task_id),
        };
        let updated_model = active_model
            .update(&self.db)
            .await
            .map_err(|err| update_error(err, "Comment", id))?;
        Ok(Comment::from(updated_model))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_comment(
        &self,
        comment_id: i32,
        task_id: Option<i32>,
    ) -> Result<u64, StorageError> {
        let mut query =
            comment::Entity::delete_many().filter(comment::Column::Id.eq(comment_id));
        if let Some(task_id) = task_id {
            query = query.filter(comment::Column::TaskId.eq(task_id));
        }
        let result = query.exec(&self.db).await?;
        Ok(result.rows_affected)
    }
}
