use crate::service::{ParentScope, ServiceError, check_length, ensure_deleted, task_in_column};
use crate::storage::Repository;

pub mod api;

pub const DESCRIPTION_MAX_LEN: usize = 5000;

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Comment {
    pub id: i32,
    pub description: String,
    pub task_id: i32,
}

/// A comment that has not been stored yet.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewComment {
    pub description: String,
    pub task_id: i32,
}

/// Position of a task in the board, as given by a nested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskPath {
    pub project_id: i32,
    pub column_id: i32,
    pub task_id: i32,
}

pub struct CommentService<'a> {
    repo: &'a dyn Repository,
    scope: ParentScope,
}

impl<'a> CommentService<'a> {
    pub fn new(repo: &'a dyn Repository, scope: ParentScope) -> Self {
        Self { repo, scope }
    }

    async fn check_task(&self, path: TaskPath) -> Result<(), ServiceError> {
        if self.scope.is_enforced() {
            task_in_column(self.repo, path.project_id, path.column_id, path.task_id).await?;
        }
        Ok(())
    }

    fn check_comment(&self, comment: &Comment, task_id: i32) -> Result<(), ServiceError> {
        if self.scope.is_enforced() && comment.task_id != task_id {
            return Err(ServiceError::ParentMismatch {
                entity: "Comment",
                id: comment.id,
                parent: "task",
                expected: task_id,
            });
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_comments(&self) -> Result<Vec<Comment>, ServiceError> {
        Ok(self.repo.get_comments().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_comment(
        &self,
        path: TaskPath,
        comment_id: i32,
    ) -> Result<Comment, ServiceError> {
        let comment = self.repo.get_comment(comment_id).await?;
        self.check_comment(&comment, path.task_id)?;
        self.check_task(path).await?;
        Ok(comment)
    }

    /// Retrieves the comments of a task.
    #[tracing::instrument(skip(self))]
    pub async fn get_all_by_task_id(&self, path: TaskPath) -> Result<Vec<Comment>, ServiceError> {
        self.check_task(path).await?;
        let task = self.repo.get_task(path.task_id).await?;
        Ok(task.comments)
    }

    /// Creates a comment on an existing task.
    #[tracing::instrument(skip(self))]
    pub async fn create_comment(
        &self,
        path: TaskPath,
        comment: NewComment,
    ) -> Result<Comment, ServiceError> {
        check_length("comment description", &comment.description, DESCRIPTION_MAX_LEN)?;
        if self.scope.is_enforced() {
            self.check_task(path).await?;
        } else {
            self.repo.find_task(comment.task_id).await?;
        }
        Ok(self.repo.create_comment(comment).await?)
    }

    /// Replaces a stored comment after checking that it and its task exist.
    #[tracing::instrument(skip(self))]
    pub async fn update_comment(
        &self,
        path: TaskPath,
        comment: Comment,
    ) -> Result<Comment, ServiceError> {
        check_length("comment description", &comment.description, DESCRIPTION_MAX_LEN)?;
        let stored = self.repo.get_comment(comment.id).await?;
        if self.scope.is_enforced() {
            self.check_comment(&stored, path.task_id)?;
            self.check_task(path).await?;
        } else {
            self.repo.find_task(comment.task_id).await?;
        }
        Ok(self.repo.update_comment(comment).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_comment(&self, path: TaskPath, comment_id: i32) -> Result<(), ServiceError> {
        if !self.scope.is_enforced() {
            self.repo.delete_comment(comment_id, None).await?;
            return Ok(());
        }
        let stored = self.repo.get_comment(comment_id).await?;
        self.check_comment(&stored, path.task_id)?;
        self.check_task(path).await?;
        let rows_affected = self
            .repo
            .delete_comment(comment_id, Some(path.task_id))
            .await?;
        ensure_deleted(rows_affected, "Comment", comment_id)
    }
}
