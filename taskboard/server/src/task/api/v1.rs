use crate::auth::CurrentUser;
use crate::entities::sea_orm_active_enums::{Priority, Status};
use crate::task::schedule::WeeklyHistogram;
use crate::task::stats::Dashboard;
use crate::task::store::{SortBy, TaskQuery};
use crate::task::{NewTask, Task, TaskPatch, TaskService, TaskServiceError, TaskState};
use crate::web::api::v1::ErrorResponse;
use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Chart colors for Todo, In Progress, Completed and Expired.
pub const STATUS_COLORS: [&str; 4] = ["#F59E0B", "#3B82F6", "#10B981", "#EF4444"];

const INTERNAL_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request. Please try again later.";

impl IntoResponse for TaskServiceError {
    fn into_response(self) -> Response {
        let (status_code, error) = match &self {
            TaskServiceError::Validation(_) | TaskServiceError::WeekOutOfRange(_) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            TaskServiceError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
            TaskServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            TaskServiceError::Internal(_) | TaskServiceError::Database(_) => {
                tracing::error!("Task request failed: {}", self);
                let body = ErrorResponse::new("INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE);
                return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            }
        };
        (status_code, Json(ErrorResponse::new(error, self.to_string()))).into_response()
    }
}

/// API response for listing tasks.
#[derive(Debug, Serialize, ToSchema)]
pub struct TasksResponse {
    /// Matching tasks
    tasks: Vec<Task>,
    /// Number of matching tasks
    count: usize,
}

/// API response for a deleted task.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteTaskResponse {
    message: String,
    task: Task,
}

/// Query parameters for listing tasks.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskListParams {
    /// Case-insensitive substring of the task name
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    status: Option<Status>,
    /// Field to sort by, ascending; newest first when absent
    #[serde(default, alias = "sortBy")]
    sort_by: Option<SortBy>,
}

impl From<TaskListParams> for TaskQuery {
    fn from(params: TaskListParams) -> Self {
        Self {
            search: params.search,
            priority: params.priority,
            status: params.status,
            sort_by: params.sort_by,
        }
    }
}

/// Query parameters for the weekly histogram.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DailyTimeSpentParams {
    /// Any date in the requested week; today when absent
    #[serde(default, alias = "startDate")]
    start_date: Option<NaiveDate>,
}

/// Hours per weekday, Monday first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyTimeSpentResponse {
    week_start: NaiveDate,
    week_end: NaiveDate,
    labels: Vec<String>,
    data: Vec<f64>,
    total_hours: f64,
}

impl From<WeeklyHistogram> for DailyTimeSpentResponse {
    fn from(histogram: WeeklyHistogram) -> Self {
        Self {
            week_start: histogram.week.first_day(),
            week_end: histogram.week.last_day(),
            labels: histogram.labels().iter().map(|label| label.to_string()).collect(),
            data: histogram.hours.to_vec(),
            total_hours: histogram.total_hours(),
        }
    }
}

/// Task counts per status, shaped for a doughnut chart.
#[derive(Debug, Serialize, ToSchema)]
pub struct TaskStatusResponse {
    labels: Vec<String>,
    datasets: Vec<StatusDataset>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusDataset {
    data: Vec<usize>,
    background_color: Vec<String>,
    hover_offset: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCountsJson {
    todo: usize,
    in_progress: usize,
    completed: usize,
    expired: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriorityCountsJson {
    high: usize,
    medium: usize,
    low: usize,
}

/// Summary of the current user's tasks.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    total_tasks: usize,
    status_counts: StatusCountsJson,
    priority_counts: PriorityCountsJson,
    total_estimated_hours: f64,
    /// Unfinished tasks due within the next seven days
    due_soon: usize,
}

impl From<Dashboard> for DashboardResponse {
    fn from(dashboard: Dashboard) -> Self {
        let status = dashboard.status_counts;
        let priority = dashboard.priority_counts;
        Self {
            total_tasks: dashboard.total_tasks,
            status_counts: StatusCountsJson {
                todo: status.todo,
                in_progress: status.in_progress,
                completed: status.completed,
                expired: status.expired,
            },
            priority_counts: PriorityCountsJson {
                high: priority.high,
                medium: priority.medium,
                low: priority.low,
            },
            total_estimated_hours: dashboard.total_estimated_hours,
            due_soon: dashboard.due_soon,
        }
    }
}

/// Handler for POST /api/v1/tasks - Creates a task for the current user.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = NewTask,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Task dates or status are invalid", body = ErrorResponse),
        (status = 409, description = "Task name already used by this user", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn create_task_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), TaskServiceError> {
    let task = TaskService::from_state(&state)
        .create_task(&user.user_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Handler for GET /api/v1/tasks - Lists the current user's tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(TaskListParams),
    responses(
        (status = 200, description = "Successfully retrieved tasks", body = TasksResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn list_tasks_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<TaskListParams>,
) -> Result<Json<TasksResponse>, TaskServiceError> {
    let tasks = TaskService::from_state(&state)
        .list_tasks(&user.user_id, &TaskQuery::from(params))
        .await?;
    let count = tasks.len();
    Ok(Json(TasksResponse { tasks, count }))
}

/// Handler for GET /api/v1/tasks/{id} - Returns one task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task found", body = Task),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn get_task_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<Task>, TaskServiceError> {
    let task = TaskService::from_state(&state)
        .get_task(&user.user_id, id)
        .await?;
    Ok(Json(task))
}

/// Handler for PUT /api/v1/tasks/{id} - Applies a partial update.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    request_body = TaskPatch,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Task dates or status are invalid", body = ErrorResponse),
        (status = 404, description = "Task not found", body = ErrorResponse),
        (status = 409, description = "Task name already used by this user", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn update_task_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<TaskPatch>,
) -> Result<Json<Task>, TaskServiceError> {
    let task = TaskService::from_state(&state)
        .update_task(&user.user_id, id, payload)
        .await?;
    Ok(Json(task))
}

/// Handler for DELETE /api/v1/tasks/{id} - Deletes a task.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = i32, Path, description = "Task ID")),
    responses(
        (status = 200, description = "Task deleted", body = DeleteTaskResponse),
        (status = 404, description = "Task not found", body = ErrorResponse)
    ),
    tag = "Tasks"
)]
pub async fn delete_task_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteTaskResponse>, TaskServiceError> {
    let task = TaskService::from_state(&state)
        .delete_task(&user.user_id, id)
        .await?;
    Ok(Json(DeleteTaskResponse {
        message: "Task deleted successfully".to_string(),
        task,
    }))
}

/// Handler for GET /api/v1/tasks/daily-time-spent - Weekly hours per weekday.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/daily-time-spent",
    params(DailyTimeSpentParams),
    responses(
        (status = 200, description = "Hours per weekday", body = DailyTimeSpentResponse),
        (status = 400, description = "startDate is outside the supported range", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Statistics"
)]
pub async fn daily_time_spent_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<DailyTimeSpentParams>,
) -> Result<Json<DailyTimeSpentResponse>, TaskServiceError> {
    let service = TaskService::from_state(&state);
    let anchor = params.start_date.unwrap_or_else(|| service.today());
    let histogram = service.daily_time_spent(&user.user_id, anchor).await?;
    Ok(Json(DailyTimeSpentResponse::from(histogram)))
}

/// Handler for GET /api/v1/tasks/status - Task counts per status.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/tasks/status",
    responses(
        (status = 200, description = "Task counts per status", body = TaskStatusResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Statistics"
)]
pub async fn task_status_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<TaskStatusResponse>, TaskServiceError> {
    let counts = TaskService::from_state(&state)
        .status_counts(&user.user_id)
        .await?;
    let labels = [
        Status::Todo,
        Status::InProgress,
        Status::Completed,
        Status::Expired,
    ]
    .iter()
    .map(|status| status.label().to_string())
    .collect();
    Ok(Json(TaskStatusResponse {
        labels,
        datasets: vec![StatusDataset {
            data: counts.as_array().to_vec(),
            background_color: STATUS_COLORS.iter().map(|color| color.to_string()).collect(),
            hover_offset: 10,
        }],
    }))
}

/// Handler for GET /api/v1/dashboard - Summary of the user's tasks.
#[tracing::instrument(skip(state))]
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Statistics"
)]
pub async fn dashboard_handler(
    State(state): State<TaskState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<DashboardResponse>, TaskServiceError> {
    let dashboard = TaskService::from_state(&state)
        .dashboard(&user.user_id)
        .await?;
    Ok(Json(DashboardResponse::from(dashboard)))
}

/// Creates and returns the tasks API router.
pub fn create_api_router(state: TaskState) -> Router {
    Router::new()
        .route("/tasks", get(list_tasks_handler).post(create_task_handler))
        .route("/tasks/daily-time-spent", get(daily_time_spent_handler))
        .route("/tasks/status", get(task_status_handler))
        .route(
            "/tasks/{id}",
            get(get_task_handler)
                .put(update_task_handler)
                .delete(delete_task_handler),
        )
        .route("/dashboard", get(dashboard_handler))
        .with_state(state)
}
