use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Task::Table)
                    .if_not_exists()
                    .col(pk_auto(Task::Id))
                    .col(string(Task::UserId))
                    .col(string(Task::Name))
                    .col(text_null(Task::Description))
                    .col(string(Task::Priority))
                    .col(string(Task::Status).default("Todo"))
                    .col(double(Task::EstimatedTime).default(0.0))
                    .col(timestamp_with_time_zone(Task::StartDate))
                    .col(timestamp_with_time_zone(Task::DueDate))
                    .col(timestamp_with_time_zone(Task::CreatedAt))
                    .col(timestamp_with_time_zone(Task::UpdatedAt))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Task::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Task {
    Table,
    Id,
    UserId,
    Name,
    Description,
    Priority,
    Status,
    EstimatedTime,
    StartDate,
    DueDate,
    CreatedAt,
    UpdatedAt,
}
