//! Weekly time distribution.
//!
//! Spreads each task's estimated hours over the calendar days it spans and
//! sums them per weekday, Monday first. Only tasks that lie entirely inside
//! the requested week are counted; a task that starts before Monday or ends
//! after Sunday is left out rather than clipped.
//!
//! A task spans `floor(days between start and due) + 1` days. The first
//! `days - 1` calendar days from the start date each get an even share and the
//! due date gets the remainder, so a 2h task from 23:00 to 01:00 credits only
//! its due date.

use super::Task;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Utc};

/// Labels of the seven histogram buckets.
pub const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// No single day is credited with more than this many hours.
pub const MAX_HOURS_PER_DAY: f64 = 24.0;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    /// A task reached the aggregator with a due date before its start date.
    #[error("Task {task_id} spans {days_in_task} days; expected at least one")]
    InvalidDaySpan { task_id: i32, days_in_task: i64 },
    /// The week around the anchor runs past the representable calendar.
    #[error("The week containing {anchor} is outside the supported date range.")]
    WeekOutOfRange { anchor: NaiveDate },
}

/// A Monday to Sunday week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Week {
    monday: NaiveDate,
    sunday: NaiveDate,
    next_monday: NaiveDate,
}

impl Week {
    /// Returns the week that contains `anchor`, or `None` when that week
    /// reaches past the first or last representable date.
    pub fn containing(anchor: NaiveDate) -> Option<Self> {
        let offset = u64::from(anchor.weekday().num_days_from_monday());
        let monday = anchor.checked_sub_days(Days::new(offset))?;
        Some(Self {
            monday,
            sunday: monday.checked_add_days(Days::new(6))?,
            next_monday: monday.checked_add_days(Days::new(7))?,
        })
    }

    /// Monday of this week.
    pub fn first_day(&self) -> NaiveDate {
        self.monday
    }

    /// Sunday of this week.
    pub fn last_day(&self) -> NaiveDate {
        self.sunday
    }

    /// Monday 00:00 UTC.
    pub fn start(&self) -> DateTime<Utc> {
        self.monday.and_time(NaiveTime::MIN).and_utc()
    }

    /// Midnight after Sunday, the first instant outside the week.
    pub fn end(&self) -> DateTime<Utc> {
        self.next_monday.and_time(NaiveTime::MIN).and_utc()
    }

    /// Returns `true` when the task starts and ends within this week.
    pub fn contains(&self, task: &Task) -> bool {
        task.start_date >= self.start() && task.due_date < self.end()
    }
}

/// Hours per weekday for one week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyHistogram {
    pub week: Week,
    /// Indexed Monday (0) to Sunday (6).
    pub hours: [f64; 7],
}

impl WeeklyHistogram {
    pub fn labels(&self) -> [&'static str; 7] {
        WEEKDAY_LABELS
    }

    pub fn total_hours(&self) -> f64 {
        self.hours.iter().sum()
    }
}

/// Builds the histogram of `tasks` for the week containing `anchor`.
pub fn weekly_histogram(tasks: &[Task], anchor: NaiveDate) -> Result<WeeklyHistogram, ScheduleError> {
    let week = Week::containing(anchor).ok_or(ScheduleError::WeekOutOfRange { anchor })?;
    let mut hours = [0.0; 7];

    for task in tasks.iter().filter(|task| week.contains(task)) {
        distribute(task, &mut hours)?;
    }

    Ok(WeeklyHistogram { week, hours })
}

fn distribute(task: &Task, hours: &mut [f64; 7]) -> Result<(), ScheduleError> {
    let span_seconds = (task.due_date - task.start_date).num_seconds();
    let days_in_task = span_seconds.div_euclid(SECONDS_PER_DAY) + 1;
    if days_in_task < 1 {
        return Err(ScheduleError::InvalidDaySpan {
            task_id: task.id,
            days_in_task,
        });
    }

    let hours_per_day = (task.estimated_time / days_in_task as f64).ceil();

    // Every day but the last gets an even share; a task shorter than a full
    // day has no such days even when it crosses midnight.
    let full_days = usize::try_from(days_in_task - 1).unwrap_or_default();
    for day in task.start_date.date_naive().iter_days().take(full_days) {
        hours[weekday_index(day)] += hours_per_day.min(MAX_HOURS_PER_DAY);
    }

    // The due day takes whatever is left of the estimate.
    let remainder = task.estimated_time - hours_per_day * (days_in_task - 1) as f64;
    hours[weekday_index(task.due_date.date_naive())] += remainder.clamp(0.0, MAX_HOURS_PER_DAY);

    Ok(())
}

fn weekday_index(day: NaiveDate) -> usize {
    day.weekday().num_days_from_monday() as usize
}
