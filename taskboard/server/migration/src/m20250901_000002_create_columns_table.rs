use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// Parent keys are indexed but not constrained: deleting a project leaves its
// columns in place.
const IDX_COLUMNS_PROJECT_ID: &str = "idx-columns-project_id";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Columns::Table)
                    .if_not_exists()
                    .col(pk_auto(Columns::Id))
                    // Room for a 500-character project name plus "_default".
                    .col(string_len(Columns::Name, 508))
                    .col(integer(Columns::ProjectId))
                    .col(integer(Columns::OrderNumber).default(0))
                    .col(string(Columns::Status).default(""))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name(IDX_COLUMNS_PROJECT_ID)
                    .table(Columns::Table)
                    .col(Columns::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_COLUMNS_PROJECT_ID)
                    .table(Columns::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(Columns::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Columns {
    Table,
    Id,
    Name,
    ProjectId,
    OrderNumber,
    Status,
}
