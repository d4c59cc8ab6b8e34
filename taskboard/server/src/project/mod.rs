use crate::column::{ExtendedColumn, NewColumn};
use crate::service::{ParentScope, ServiceError, check_length, ensure_deleted};
use crate::storage::Repository;

pub mod api;

/// Suffix of the column every project is created with.
pub const DEFAULT_COLUMN_SUFFIX: &str = "_default";

pub const NAME_MAX_LEN: usize = 500;
pub const DESCRIPTION_MAX_LEN: usize = 1000;

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct Project {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// A project that has not been stored yet.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

/// A project together with its columns, their tasks and the tasks' comments.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct ExtendedProject {
    pub project: Project,
    pub columns: Vec<ExtendedColumn>,
}

fn validate(name: &str, description: &str) -> Result<(), ServiceError> {
    if name.trim().is_empty() {
        return Err(ServiceError::Validation(
            "project name must not be empty".to_string(),
        ));
    }
    check_length("project name", name, NAME_MAX_LEN)?;
    check_length("project description", description, DESCRIPTION_MAX_LEN)
}

pub struct ProjectService<'a> {
    repo: &'a dyn Repository,
    scope: ParentScope,
}

impl<'a> ProjectService<'a> {
    pub fn new(repo: &'a dyn Repository, scope: ParentScope) -> Self {
        Self { repo, scope }
    }

    /// Retrieves every project, without children.
    #[tracing::instrument(skip(self))]
    pub async fn get_projects(&self) -> Result<Vec<Project>, ServiceError> {
        Ok(self.repo.get_projects().await?)
    }

    /// Retrieves a project with all of its columns, tasks and comments.
    #[tracing::instrument(skip(self))]
    pub async fn get_project(&self, id: i32) -> Result<ExtendedProject, ServiceError> {
        Ok(self.repo.get_project(id).await?)
    }

    /// Creates a project and its default column.
    ///
    /// The default column is named `"<project name>_default"`. The two
    /// inserts are not atomic: if the column cannot be created the project
    /// stays stored and the error is returned.
    ///
    /// # Returns
    ///
    /// The stored project, carrying its newly assigned ID.
    #[tracing::instrument(skip(self))]
    pub async fn create_project(&self, project: NewProject) -> Result<Project, ServiceError> {
        validate(&project.name, &project.description)?;
        let created = self.repo.create_project(project).await?;

        let default_column = NewColumn {
            name: format!("{}{}", created.name, DEFAULT_COLUMN_SUFFIX),
            project_id: created.id,
            order_num: 0,
            status: String::new(),
        };
        if let Err(err) = self.repo.create_column(default_column).await {
            tracing::warn!(
                "Project {} was stored without its default column: {}",
                created.id,
                err
            );
            return Err(err.into());
        }
        Ok(created)
    }

    /// Replaces a stored project after checking that it exists.
    #[tracing::instrument(skip(self))]
    pub async fn update_project(&self, project: Project) -> Result<Project, ServiceError> {
        validate(&project.name, &project.description)?;
        self.repo.find_project(project.id).await?;
        Ok(self.repo.update_project(project).await?)
    }

    /// Deletes a project. Its columns are left in place.
    #[tracing::instrument(skip(self))]
    pub async fn delete_project(&self, id: i32) -> Result<(), ServiceError> {
        let rows_affected = self.repo.delete_project(id).await?;
        if self.scope.is_enforced() {
            ensure_deleted(rows_affected, "Project", id)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::storage::{MockRepository, StorageError};
    use mockall::predicate::*;
    use sea_orm::DbErr;

    fn demo_project(id: i32) -> Project {
        Project {
            id,
            name: "Demo".to_string(),
            description: "d".to_string(),
        }
    }

    #[tokio::test]
    async fn create_project_adds_default_column() {
        let mut repo = MockRepository::new();
        repo.expect_create_project()
            .with(eq(NewProject {
                name: "Demo".to_string(),
                description: "d".to_string(),
            }))
            .times(1)
            .returning(|_| Ok(demo_project(7)));
        repo.expect_create_column()
            .withf(|column: &NewColumn| column.name == "Demo_default" && column.project_id == 7)
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

        let service = ProjectService::new(&repo, ParentScope::Enforce);
        let created = service
            .create_project(NewProject {
                name: "Demo".to_string(),
                description: "d".to_string(),
            })
            .await
            .expect("project should be created");

        assert_eq!(created, demo_project(7));
    }

    #[tokio::test]
    async fn create_project_reports_default_column_failure() {
        let mut repo = MockRepository::new();
        repo.expect_create_project()
            .times(1)
            .returning(|_| Ok(demo_project(3)));
        repo.expect_create_column()
            .times(1)
            .returning(|_| Err(StorageError::Database(DbErr::Custom("disk full".into()))));

        let service = ProjectService::new(&repo, ParentScope::Enforce);
        let result = service
            .create_project(NewProject {
                name: "Demo".to_string(),
                description: String::new(),
            })
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::Storage(StorageError::Database(_)))
        ));
    }

    #[tokio::test]
    async fn create_project_rejects_blank_name() {
        let repo = MockRepository::new();
        let service = ProjectService::new(&repo, ParentScope::Enforce);

        let result = service
            .create_project(NewProject {
                name: "   ".to_string(),
                description: "d".to_string(),
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn create_project_with_longest_name_gets_default_column() {
        let name = "p".repeat(NAME_MAX_LEN);
        let mut repo = MockRepository::new();
        repo.expect_create_project().times(1).returning(|project| {
            Ok(Project {
                id: 1,
                name: project.name,
                description: project.description,
            })
        });
        repo.expect_create_column()
            .withf(|column: &NewColumn| {
                column.name.chars().count() <= crate::column::NAME_MAX_LEN
                    && column.name.ends_with(DEFAULT_COLUMN_SUFFIX)
            })
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

        let service = ProjectService::new(&repo, ParentScope::Enforce);
        let created = service
            .create_project(NewProject {
                name: name.clone(),
                description: String::new(),
            })
            .await
            .expect("project should be created");

        assert_eq!(created.name, name);
    }

    #[tokio::test]
    async fn create_project_rejects_overlong_name_before_storage() {
        let mut repo = MockRepository::new();
        repo.expect_create_project().never();
        repo.expect_create_column().never();

        let service = ProjectService::new(&repo, ParentScope::Enforce);
        let result = service
            .create_project(NewProject {
                name: "p".repeat(NAME_MAX_LEN + 1),
                description: String::new(),
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_project_rejects_overlong_description() {
        let mut repo = MockRepository::new();
        repo.expect_find_project().never();
        repo.expect_update_project().never();

        let service = ProjectService::new(&repo, ParentScope::Enforce);
        let mut changed = demo_project(5);
        changed.description = "d".repeat(DESCRIPTION_MAX_LEN + 1);
        let result = service.update_project(changed).await;

        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn update_project_fails_when_project_is_missing() {
        let mut repo = MockRepository::new();
        repo.expect_find_project()
            .with(eq(42))
            .times(1)
            .returning(|id| Err(StorageError::not_found("Project", id)));
        repo.expect_update_project().never();

        let service = ProjectService::new(&repo, ParentScope::Enforce);
        let result = service.update_project(demo_project(42)).await;

        let err = result.expect_err("update should fail");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Project with ID 42 not found");
    }

    #[tokio::test]
    async fn update_project_writes_after_existence_check() {
        let mut repo = MockRepository::new();
        repo.expect_find_project()
            .with(eq(5))
            .times(1)
            .returning(|id| Ok(demo_project(id)));
        repo.expect_update_project()
            .times(1)
            .returning(|project| Ok(project));

        let service = ProjectService::new(&repo, ParentScope::Enforce);
        let mut changed = demo_project(5);
        changed.description = "changed".to_string();
        let updated = service
            .update_project(changed.clone())
            .await
            .expect("update should succeed");

        assert_eq!(updated, changed);
    }

    #[tokio::test]
    async fn delete_missing_project_depends_on_scope() {
        let mut repo = MockRepository::new();
        repo.expect_delete_project()
            .with(eq(9))
            .times(2)
            .returning(|_| Ok(0));

        let strict = ProjectService::new(&repo, ParentScope::Enforce);
        let err = strict.delete_project(9).await.expect_err("should fail");
        assert!(err.is_not_found());

        let lenient = ProjectService::new(&repo, ParentScope::Ignore);
        assert!(lenient.delete_project(9).await.is_ok());
    }
}
