use super::Task;
use crate::entities::sea_orm_active_enums::{Priority, Status};
use crate::entities::task;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;
use serde::Deserialize;
use utoipa::ToSchema;

/// A task that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTaskRecord {
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub estimated_time: f64,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Validated changes to an existing task. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskChanges {
    pub name: Option<String>,
    /// `Some(None)` clears the description.
    pub description: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub estimated_time: Option<f64>,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Field a task listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    Name,
    Priority,
    Status,
    StartDate,
    DueDate,
    EstimatedTime,
    CreatedAt,
}

/// Filters for listing a user's tasks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskQuery {
    /// Case-insensitive substring of the task name.
    pub search: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    /// Ascending order on this field; newest first when absent.
    pub sort_by: Option<SortBy>,
}

/// Persistence for tasks. Every lookup is scoped to the owning user.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, record: NewTaskRecord) -> Result<Task, DbErr>;

    async fn find_task_by_id(&self, user_id: &str, id: i32) -> Result<Option<Task>, DbErr>;

    async fn find_task_by_name(&self, user_id: &str, name: &str) -> Result<Option<Task>, DbErr>;

    /// Tasks starting at or after `from` and due before `until`.
    async fn find_tasks_in_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Task>, DbErr>;

    async fn list_tasks(&self, user_id: &str, query: &TaskQuery) -> Result<Vec<Task>, DbErr>;

    /// Applies `changes`, returning `None` when the task does not exist.
    async fn update_task(
        &self,
        user_id: &str,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, DbErr>;

    /// Deletes the task, returning it, or `None` when it does not exist.
    async fn delete_task(&self, user_id: &str, id: i32) -> Result<Option<Task>, DbErr>;
}

/// [`TaskStore`] backed by a sea-orm connection.
#[derive(Clone, Debug)]
pub struct SeaOrmTaskStore {
    db: DatabaseConnection,
}

impl SeaOrmTaskStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn find_model(&self, user_id: &str, id: i32) -> Result<Option<task::Model>, DbErr> {
        task::Entity::find_by_id(id)
            .filter(task::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }
}

#[async_trait]
impl TaskStore for SeaOrmTaskStore {
    #[tracing::instrument(skip(self))]
    async fn create_task(&self, record: NewTaskRecord) -> Result<Task, DbErr> {
        let active_model = task::ActiveModel {
            user_id: ActiveValue::Set(record.user_id),
            name: ActiveValue::Set(record.name),
            description: ActiveValue::Set(record.description),
            priority: ActiveValue::Set(record.priority),
            status: ActiveValue::Set(record.status),
            estimated_time: ActiveValue::Set(record.estimated_time),
            start_date: ActiveValue::Set(record.start_date),
            due_date: ActiveValue::Set(record.due_date),
            created_at: ActiveValue::Set(record.created_at),
            updated_at: ActiveValue::Set(record.created_at),
            ..Default::default()
        };
        let created_model = active_model.insert(&self.db).await?;
        Ok(Task::from(created_model))
    }

    #[tracing::instrument(skip(self))]
    async fn find_task_by_id(&self, user_id: &str, id: i32) -> Result<Option<Task>, DbErr> {
        Ok(self.find_model(user_id, id).await?.map(Task::from))
    }

    #[tracing::instrument(skip(self))]
    async fn find_task_by_name(&self, user_id: &str, name: &str) -> Result<Option<Task>, DbErr> {
        let model = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .filter(task::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(model.map(Task::from))
    }

    #[tracing::instrument(skip(self))]
    async fn find_tasks_in_range(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<Vec<Task>, DbErr> {
        let tasks = task::Entity::find()
            .filter(task::Column::UserId.eq(user_id))
            .filter(task::Column::StartDate.gte(from))
            .filter(task::Column::DueDate.lt(until))
            .order_by_asc(task::Column::StartDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn list_tasks(&self, user_id: &str, query: &TaskQuery) -> Result<Vec<Task>, DbErr> {
        let mut select = task::Entity::find().filter(task::Column::UserId.eq(user_id));

        if let Some(search) = query.search.as_deref().filter(|search| !search.is_empty()) {
            let pattern = format!("%{}%", search.to_lowercase());
            select = select.filter(Expr::expr(Func::lower(Expr::col(task::Column::Name))).like(pattern));
        }
        if let Some(priority) = query.priority {
            select = select.filter(task::Column::Priority.eq(priority));
        }
        if let Some(status) = query.status {
            select = select.filter(task::Column::Status.eq(status));
        }

        select = match query.sort_by {
            Some(SortBy::Name) => select.order_by_asc(task::Column::Name),
            Some(SortBy::Priority) => select.order_by_asc(task::Column::Priority),
            Some(SortBy::Status) => select.order_by_asc(task::Column::Status),
            Some(SortBy::StartDate) => select.order_by_asc(task::Column::StartDate),
            Some(SortBy::DueDate) => select.order_by_asc(task::Column::DueDate),
            Some(SortBy::EstimatedTime) => select.order_by_asc(task::Column::EstimatedTime),
            Some(SortBy::CreatedAt) => select.order_by_asc(task::Column::CreatedAt),
            None => select.order_by_desc(task::Column::CreatedAt),
        };

        let tasks = select
            .order_by_asc(task::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Task::from)
            .collect();
        Ok(tasks)
    }

    #[tracing::instrument(skip(self))]
    async fn update_task(
        &self,
        user_id: &str,
        id: i32,
        changes: TaskChanges,
    ) -> Result<Option<Task>, DbErr> {
        let Some(task_to_update) = self.find_model(user_id, id).await? else {
            return Ok(None);
        };

        let mut active_model: task::ActiveModel = task_to_update.into();
        if let Some(name) = changes.name {
            active_model.name = ActiveValue::Set(name);
        }
        if let Some(description) = changes.description {
            active_model.description = ActiveValue::Set(description);
        }
        if let Some(priority) = changes.priority {
            active_model.priority = ActiveValue::Set(priority);
        }
        if let Some(status) = changes.status {
            active_model.status = ActiveValue::Set(status);
        }
        if let Some(estimated_time) = changes.estimated_time {
            active_model.estimated_time = ActiveValue::Set(estimated_time);
        }
        if let Some(start_date) = changes.start_date {
            active_model.start_date = ActiveValue::Set(start_date);
        }
        if let Some(due_date) = changes.due_date {
            active_model.due_date = ActiveValue::Set(due_date);
        }
        active_model.updated_at = ActiveValue::Set(changes.updated_at);

        let updated_model = active_model.update(&self.db).await?;
        Ok(Some(Task::from(updated_model)))
    }

    #[tracing::instrument(skip(self))]
    async fn delete_task(&self, user_id: &str, id: i32) -> Result<Option<Task>, DbErr> {
        let Some(task_to_delete) = self.find_model(user_id, id).await? else {
            return Ok(None);
        };

        let deleted = Task::from(task_to_delete);
        task::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(Some(deleted))
    }
}
