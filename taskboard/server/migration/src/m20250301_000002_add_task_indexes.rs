use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const TASK_USER_ID_NAME_UNIQUE: &str = "task_user_id_name_unique";
const IDX_TASK_USER_ID_START_DATE: &str = "idx_task_user_id_start_date";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // A task name is unique per owning user.
        manager
            .create_index(
                Index::create()
                    .name(TASK_USER_ID_NAME_UNIQUE)
                    .table(Task::Table)
                    .col(Task::UserId)
                    .col(Task::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(IDX_TASK_USER_ID_START_DATE)
                    .table(Task::Table)
                    .col(Task::UserId)
                    .col(Task::StartDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(IDX_TASK_USER_ID_START_DATE)
                    .table(Task::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name(TASK_USER_ID_NAME_UNIQUE)
                    .table(Task::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum Task {
    Table,
    UserId,
    Name,
    StartDate,
}
