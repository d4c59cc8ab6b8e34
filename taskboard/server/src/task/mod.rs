use crate::comment::Comment;
use crate::service::{
    ParentScope, ServiceError, check_length, column_in_project, ensure_deleted, task_in_column,
};
use crate::storage::Repository;

pub mod api;

pub const NAME_MAX_LEN: usize = 500;
pub const DESCRIPTION_MAX_LEN: usize = 5000;

fn validate(name: &str, description: &str) -> Result<(), ServiceError> {
    check_length("task name", name, NAME_MAX_LEN)?;
    check_length("task description", description, DESCRIPTION_MAX_LEN)
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub status: bool,
    pub description: String,
    pub column_id: i32,
}

/// A task that has not been stored yet.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewTask {
    pub name: String,
    pub status: bool,
    pub description: String,
    pub column_id: i32,
}

/// A task together with its comments.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct ExtendedTask {
    pub task: Task,
    pub comments: Vec<Comment>,
}

pub struct TaskService<'a> {
    repo: &'a dyn Repository,
    scope: ParentScope,
}

impl<'a> TaskService<'a> {
    pub fn new(repo: &'a dyn Repository, scope: ParentScope) -> Self {
        Self { repo, scope }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_tasks(&self) -> Result<Vec<Task>, ServiceError> {
        Ok(self.repo.get_tasks().await?)
    }

    /// Retrieves a task with its comments.
    ///
    /// The project and column ids are only checked under
    /// [`ParentScope::Enforce`].
    #[tracing::instrument(skip(self))]
    pub async fn get_task(
        &self,
        project_id: i32,
        column_id: i32,
        task_id: i32,
    ) -> Result<ExtendedTask, ServiceError> {
        if self.scope.is_enforced() {
            task_in_column(self.repo, project_id, column_id, task_id).await?;
        }
        Ok(self.repo.get_task(task_id).await?)
    }

    /// Retrieves the tasks of a column, each with its comments.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_by_column_id(
        &self,
        project_id: i32,
        column_id: i32,
    ) -> Result<Vec<ExtendedTask>, ServiceError> {
        if self.scope.is_enforced() {
            column_in_project(self.repo, project_id, column_id).await?;
        }
        let column = self.repo.get_column(column_id).await?;
        Ok(column.tasks)
    }

    /// Creates a task in an existing column.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, project_id: i32, task: NewTask) -> Result<Task, ServiceError> {
        validate(&task.name, &task.description)?;
        if self.scope.is_enforced() {
            column_in_project(self.repo, project_id, task.column_id).await?;
        } else {
            self.repo.find_column(task.column_id).await?;
        }
        Ok(self.repo.create_task(task).await?)
    }

    /// Replaces a stored task after checking that it and its column exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(&self, project_id: i32, task: Task) -> Result<Task, ServiceError> {
        validate(&task.name, &task.description)?;
        if self.scope.is_enforced() {
            task_in_column(self.repo, project_id, task.column_id, task.id).await?;
        } else {
            self.repo.find_task(task.id).await?;
            self.repo.find_column(task.column_id).await?;
        }
        Ok(self.repo.update_task(task).await?)
    }

    /// Deletes a task. Its comments are left in place.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(
        &self,
        project_id: i32,
        column_id: i32,
        task_id: i32,
    ) -> Result<(), ServiceError> {
        if !self.scope.is_enforced() {
            self.repo.delete_task(task_id, None).await?;
            return Ok(());
        }
        task_in_column(self.repo, project_id, column_id, task_id).await?;
        let rows_affected = self.repo.delete_task(task_id, Some(column_id)).await?;
        ensure_deleted(rows_affected, "Task", task_id)
    }
}
