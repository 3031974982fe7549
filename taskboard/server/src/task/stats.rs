use super::Task;
use crate::entities::sea_orm_active_enums::{Priority, Status};
use chrono::{DateTime, Duration, Utc};

/// Number of tasks in each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub todo: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub expired: usize,
}

impl StatusCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            match task.status {
                Status::Todo => counts.todo += 1,
                Status::InProgress => counts.in_progress += 1,
                Status::Completed => counts.completed += 1,
                Status::Expired => counts.expired += 1,
            }
            counts
        })
    }

    /// Counts in chart order: Todo, In Progress, Completed, Expired.
    pub fn as_array(&self) -> [usize; 4] {
        [self.todo, self.in_progress, self.completed, self.expired]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl PriorityCounts {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut counts, task| {
            match task.priority {
                Priority::High => counts.high += 1,
                Priority::Medium => counts.medium += 1,
                Priority::Low => counts.low += 1,
            }
            counts
        })
    }
}

/// Tasks due within this window count as upcoming on the dashboard.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// Summary of a user's tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub total_tasks: usize,
    pub status_counts: StatusCounts,
    pub priority_counts: PriorityCounts,
    pub total_estimated_hours: f64,
    /// Unfinished tasks due between now and [`UPCOMING_WINDOW_DAYS`] from now.
    pub due_soon: usize,
}

impl Dashboard {
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let horizon = now + Duration::days(UPCOMING_WINDOW_DAYS);
        Self {
            total_tasks: tasks.len(),
            status_counts: StatusCounts::from_tasks(tasks),
            priority_counts: PriorityCounts::from_tasks(tasks),
            total_estimated_hours: tasks.iter().map(|task| task.estimated_time).sum(),
            due_soon: tasks
                .iter()
                .filter(|task| task.status != Status::Completed)
                .filter(|task| task.due_date >= now && task.due_date <= horizon)
                .count(),
        }
    }
}
