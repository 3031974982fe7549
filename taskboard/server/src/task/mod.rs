use crate::clock::Clock;
use crate::entities::sea_orm_active_enums::{Priority, Status};
use crate::entities::task;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{DbErr, SqlErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

pub mod api;
pub mod schedule;
pub mod stats;
pub mod store;
pub mod validation;

use schedule::{ScheduleError, Week, WeeklyHistogram};
use stats::{Dashboard, StatusCounts};
use store::{NewTaskRecord, TaskChanges, TaskQuery, TaskStore};
use validation::{Candidate, ValidationRule};

/// A task owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i32,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    /// Budgeted duration in hours.
    pub estimated_time: f64,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<task::Model> for Task {
    fn from(model: task::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            priority: model.priority,
            status: model.status,
            estimated_time: model.estimated_time,
            start_date: model.start_date,
            due_date: model.due_date,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub priority: Priority,
    /// Defaults to `Todo`.
    #[serde(default)]
    pub status: Option<Status>,
    /// Derived from the dates when absent.
    #[serde(default)]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update of a task. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub name: Option<String>,
    /// An empty string clears the description.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub estimated_time: Option<f64>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskPatch {
    fn touches_dates(&self) -> bool {
        self.start_date.is_some() || self.due_date.is_some()
    }

    fn touches_schedule(&self) -> bool {
        self.status.is_some() || self.touches_dates()
    }
}

/// Error type for TaskService operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskServiceError {
    /// The input broke one of the schedule rules.
    #[error("{0}")]
    Validation(#[from] ValidationRule),
    /// The user already has a task with this name.
    #[error("Task with the same name already exists for this user.")]
    Conflict { name: String },
    #[error("Task with ID {0} not found")]
    NotFound(i32),
    /// The requested week cannot be represented.
    #[error("startDate {0} is outside the supported date range.")]
    WeekOutOfRange(NaiveDate),
    /// Stored data broke an invariant the validator should have enforced.
    #[error("Internal error: {0}")]
    Internal(ScheduleError),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ScheduleError> for TaskServiceError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::WeekOutOfRange { anchor } => TaskServiceError::WeekOutOfRange(anchor),
            err @ ScheduleError::InvalidDaySpan { .. } => TaskServiceError::Internal(err),
        }
    }
}

/// Shared state for task handlers.
#[derive(Clone)]
pub struct TaskState {
    pub store: Arc<dyn TaskStore>,
    pub clock: Arc<dyn Clock>,
}

pub struct TaskService<'a> {
    store: &'a dyn TaskStore,
    clock: &'a dyn Clock,
}

impl<'a> TaskService<'a> {
    pub fn new(store: &'a dyn TaskStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Builds a service over the handles held in `state`.
    pub fn from_state(state: &'a TaskState) -> Self {
        Self::new(state.store.as_ref(), state.clock.as_ref())
    }

    /// Validates and stores a new task for `user_id`.
    ///
    /// # Returns
    ///
    /// The stored task, a [`TaskServiceError::Validation`] naming the first
    /// broken rule, or [`TaskServiceError::Conflict`] when the name is taken.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(
        &self,
        user_id: &str,
        new_task: NewTask,
    ) -> Result<Task, TaskServiceError> {
        let now = self.clock.now();
        let schedule = validation::validate(
            &Candidate {
                status: new_task.status.unwrap_or_default(),
                start_date: new_task.start_date,
                due_date: new_task.due_date,
                estimated_time: new_task.estimated_time,
            },
            now,
        )?;

        if self
            .store
            .find_task_by_name(user_id, &new_task.name)
            .await?
            .is_some()
        {
            return Err(TaskServiceError::Conflict {
                name: new_task.name,
            });
        }

        let name = new_task.name.clone();
        let record = NewTaskRecord {
            user_id: user_id.to_string(),
            name: new_task.name,
            description: new_task.description,
            priority: new_task.priority,
            status: schedule.status,
            estimated_time: schedule.estimated_time,
            start_date: schedule.start_date,
            due_date: schedule.due_date,
            created_at: now,
        };
        let created = self
            .store
            .create_task(record)
            .await
            .map_err(|err| conflict_or_database(err, name))?;
        tracing::info!("Created task {} for user {}", created.id, user_id);
        Ok(created)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_task(&self, user_id: &str, id: i32) -> Result<Task, TaskServiceError> {
        self.store
            .find_task_by_id(user_id, id)
            .await?
            .ok_or(TaskServiceError::NotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(
        &self,
        user_id: &str,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, TaskServiceError> {
        Ok(self.store.list_tasks(user_id, query).await?)
    }

    /// Applies a partial update.
    ///
    /// The schedule rules run against the patch merged over the stored task,
    /// and only when the patch changes the status or a date. Supplying one
    /// date without the other fails with [`ValidationRule::DatesRequired`].
    /// When the dates move and no estimate is given, it is derived again.
    #[tracing::instrument(skip(self))]
    pub async fn update_task(
        &self,
        user_id: &str,
        id: i32,
        patch: TaskPatch,
    ) -> Result<Task, TaskServiceError> {
        let existing = self.get_task(user_id, id).await?;
        let now = self.clock.now();

        let mut changes = TaskChanges {
            name: None,
            description: patch
                .description
                .clone()
                .map(|description| Some(description).filter(|text| !text.is_empty())),
            priority: patch.priority,
            status: None,
            estimated_time: None,
            start_date: None,
            due_date: None,
            updated_at: now,
        };

        if patch.touches_schedule() {
            let (start_date, due_date) = if patch.touches_dates() {
                (patch.start_date, patch.due_date)
            } else {
                (Some(existing.start_date), Some(existing.due_date))
            };
            let estimated_time = match patch.estimated_time {
                Some(hours) => Some(hours),
                None if patch.touches_dates() => None,
                None => Some(existing.estimated_time),
            };
            let schedule = validation::validate(
                &Candidate {
                    status: patch.status.unwrap_or(existing.status),
                    start_date,
                    due_date,
                    estimated_time,
                },
                now,
            )?;
            changes.status = Some(schedule.status);
            changes.start_date = Some(schedule.start_date);
            changes.due_date = Some(schedule.due_date);
            changes.estimated_time = Some(schedule.estimated_time);
        } else if let Some(hours) = patch.estimated_time {
            let candidate = Candidate {
                status: existing.status,
                start_date: Some(existing.start_date),
                due_date: Some(existing.due_date),
                estimated_time: Some(hours),
            };
            if !ValidationRule::EstimatedTimeNonNegative.is_satisfied_by(&candidate, now) {
                return Err(ValidationRule::EstimatedTimeNonNegative.into());
            }
            changes.estimated_time = Some(hours);
        }

        if let Some(name) = patch.name.filter(|name| *name != existing.name) {
            if self.store.find_task_by_name(user_id, &name).await?.is_some() {
                return Err(TaskServiceError::Conflict { name });
            }
            changes.name = Some(name);
        }

        let conflicting_name = changes.name.clone().unwrap_or(existing.name);
        self.store
            .update_task(user_id, id, changes)
            .await
            .map_err(|err| conflict_or_database(err, conflicting_name))?
            .ok_or(TaskServiceError::NotFound(id))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, user_id: &str, id: i32) -> Result<Task, TaskServiceError> {
        let deleted = self
            .store
            .delete_task(user_id, id)
            .await?
            .ok_or(TaskServiceError::NotFound(id))?;
        tracing::info!("Deleted task {} for user {}", id, user_id);
        Ok(deleted)
    }

    /// Hours per weekday for the week containing `anchor`.
    #[tracing::instrument(skip(self))]
    pub async fn daily_time_spent(
        &self,
        user_id: &str,
        anchor: NaiveDate,
    ) -> Result<WeeklyHistogram, TaskServiceError> {
        let week =
            Week::containing(anchor).ok_or(TaskServiceError::WeekOutOfRange(anchor))?;
        let tasks = self
            .store
            .find_tasks_in_range(user_id, week.start(), week.end())
            .await?;
        schedule::weekly_histogram(&tasks, anchor).map_err(|err| {
            tracing::error!("Failed to build weekly histogram: {}", err);
            TaskServiceError::from(err)
        })
    }

    /// Today's date according to the service clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    #[tracing::instrument(skip(self))]
    pub async fn status_counts(&self, user_id: &str) -> Result<StatusCounts, TaskServiceError> {
        let tasks = self.store.list_tasks(user_id, &TaskQuery::default()).await?;
        Ok(StatusCounts::from_tasks(&tasks))
    }

    #[tracing::instrument(skip(self))]
    pub async fn dashboard(&self, user_id: &str) -> Result<Dashboard, TaskServiceError> {
        let tasks = self.store.list_tasks(user_id, &TaskQuery::default()).await?;
        Ok(Dashboard::from_tasks(&tasks, self.clock.now()))
    }
}

/// The unique index catches a name taken between our check and the insert.
fn conflict_or_database(err: DbErr, name: String) -> TaskServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => TaskServiceError::Conflict { name },
        _ => TaskServiceError::Database(err),
    }
}
