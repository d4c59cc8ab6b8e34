//! Pieces shared by the per-entity use-case services.

use crate::column::Column;
use crate::storage::{Repository, StorageError};
use crate::task::Task;
use serde::Deserialize;

/// How nested paths such as `/projects/{p}/columns/{c}` treat their parent ids.
///
/// Selected with the `PARENT_SCOPE` environment variable: `enforce` (the
/// default) or `ignore`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParentScope {
    /// Parent ids in the path must match the stored parent ids.
    #[default]
    Enforce,
    /// Parent ids in the path are informational only.
    Ignore,
}

impl ParentScope {
    pub fn is_enforced(self) -> bool {
        self == ParentScope::Enforce
    }
}

/// Error type for use-case operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An entity was addressed through a parent it does not belong to.
    #[error("{entity} {id} does not belong to {parent} {expected}")]
    ParentMismatch {
        entity: &'static str,
        id: i32,
        parent: &'static str,
        expected: i32,
    },
    /// The submitted entity violates a field invariant.
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Storage(StorageError::NotFound { .. }))
    }
}

/// Rejects a text field longer than the database column it is stored in.
///
/// Lengths are counted in characters, as `varchar(n)` does.
pub(crate) fn check_length(field: &str, value: &str, max: usize) -> Result<(), ServiceError> {
    let len = value.chars().count();
    if len > max {
        return Err(ServiceError::Validation(format!(
            "{field} must be at most {max} characters, got {len}"
        )));
    }
    Ok(())
}

/// Loads a column and checks that it belongs to `project_id`.
pub(crate) async fn column_in_project(
    repo: &dyn Repository,
    project_id: i32,
    column_id: i32,
) -> Result<Column, ServiceError> {
    let column = repo.find_column(column_id).await?;
    if column.project_id != project_id {
        return Err(ServiceError::ParentMismatch {
            entity: "Column",
            id: column_id,
            parent: "project",
            expected: project_id,
        });
    }
    Ok(column)
}

/// Loads a task and checks the whole chain project -> column -> task.
pub(crate) async fn task_in_column(
    repo: &dyn Repository,
    project_id: i32,
    column_id: i32,
    task_id: i32,
) -> Result<Task, ServiceError> {
    let task = repo.find_task(task_id).await?;
    if task.column_id != column_id {
        return Err(ServiceError::ParentMismatch {
            entity: "Task",
            id: task_id,
            parent: "column",
            expected: column_id,
        });
    }
    column_in_project(repo, project_id, column_id).await?;
    Ok(task)
}

/// Turns a delete that removed nothing into a not-found error.
pub(crate) fn ensure_deleted(
    rows_affected: u64,
    entity: &'static str,
    id: i32,
) -> Result<(), ServiceError> {
    if rows_affected == 0 {
        return Err(StorageError::not_found(entity, id).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_length_counts_characters() {
        assert!(check_length("name", &"é".repeat(4), 4).is_ok());
        let err = check_length("name", "abcde", 4).expect_err("too long");
        assert_eq!(
            err.to_string(),
            "Validation failed: name must be at most 4 characters, got 5"
        );
    }
}
