use crate::project::{self, DEFAULT_COLUMN_SUFFIX};
use crate::service::{ParentScope, ServiceError, check_length, column_in_project, ensure_deleted};
use crate::storage::Repository;
use crate::task::ExtendedTask;

pub mod api;

/// Long enough for the default column of any valid project.
pub const NAME_MAX_LEN: usize = project::NAME_MAX_LEN + DEFAULT_COLUMN_SUFFIX.len();

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Column {
    pub id: i32,
    pub name: String,
    pub project_id: i32,
    pub order_num: i32,
    pub status: String,
}

/// A column that has not been stored yet.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewColumn {
    pub name: String,
    pub project_id: i32,
    pub order_num: i32,
    pub status: String,
}

/// A column together with its tasks and their comments.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct ExtendedColumn {
    pub column: Column,
    pub tasks: Vec<ExtendedTask>,
}

pub struct ColumnService<'a> {
    repo: &'a dyn Repository,
    scope: ParentScope,
}

impl<'a> ColumnService<'a> {
    pub fn new(repo: &'a dyn Repository, scope: ParentScope) -> Self {
        Self { repo, scope }
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_columns(&self) -> Result<Vec<Column>, ServiceError> {
        Ok(self.repo.get_columns().await?)
    }

    /// Retrieves a column of a project, with its tasks and comments.
    ///
    /// Fails with [`ServiceError::ParentMismatch`] when the column exists but
    /// belongs to another project, whatever the configured scope.
    #[tracing::instrument(skip(self))]
    pub async fn get_project_column(
        &self,
        project_id: i32,
        column_id: i32,
    ) -> Result<ExtendedColumn, ServiceError> {
        let column = self.repo.get_column(column_id).await?;
        if column.column.project_id != project_id {
            return Err(ServiceError::ParentMismatch {
                entity: "Column",
                id: column_id,
                parent: "project",
                expected: project_id,
            });
        }
        Ok(column)
    }

    /// Retrieves every column of a project, each with its tasks and comments.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_by_project_id(
        &self,
        project_id: i32,
    ) -> Result<Vec<ExtendedColumn>, ServiceError> {
        let project = self.repo.get_project(project_id).await?;
        Ok(project.columns)
    }

    /// Creates a column in an existing project.
    #[tracing::instrument(skip(self))]
    pub async fn create_column(&self, column: NewColumn) -> Result<Column, ServiceError> {
        check_length("column name", &column.name, NAME_MAX_LEN)?;
        self.repo.find_project(column.project_id).await?;
        Ok(self.repo.create_column(column).await?)
    }

    /// Replaces a stored column after checking that it exists.
    ///
    /// With [`ParentScope::Enforce`] the stored column must already belong to
    /// the project named by the update; otherwise that project only has to
    /// exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_column(&self, column: Column) -> Result<Column, ServiceError> {
        check_length("column name", &column.name, NAME_MAX_LEN)?;
        if self.scope.is_enforced() {
            column_in_project(self.repo, column.project_id, column.id).await?;
        } else {
            self.repo.find_column(column.id).await?;
            self.repo.find_project(column.project_id).await?;
        }
        Ok(self.repo.update_column(column).await?)
    }

    /// Deletes a column. Its tasks are left in place.
    #[tracing::instrument(skip(self))]
    pub async fn delete_column(&self, project_id: i32, column_id: i32) -> Result<(), ServiceError> {
        if !self.scope.is_enforced() {
            self.repo.delete_column(column_id, None).await?;
            return Ok(());
        }
        column_in_project(self.repo, project_id, column_id).await?;
        let rows_affected = self.repo.delete_column(column_id, Some(project_id)).await?;
        ensure_deleted(rows_affected, "Column", column_id)
    }
}
