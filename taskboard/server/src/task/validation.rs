//! Date and status rules applied before a task is persisted.
//!
//! The rules form an ordered list. [`validate`] walks it front to back and
//! reports the first rule the candidate breaks, so the same input always
//! yields the same failure. Name uniqueness needs the task store and is
//! checked by [`TaskService`](super::TaskService) once these rules pass.

use crate::entities::sea_orm_active_enums::Status;
use chrono::{DateTime, Utc};

/// A named requirement on a task's schedule.
///
/// The `Display` text of each rule is the message shown to the client when
/// the rule is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ValidationRule {
    #[error("Both startDate and dueDate are required.")]
    DatesRequired,
    #[error("dueDate must be after startDate.")]
    DueAfterStart,
    #[error("startDate must be in the future for status \"Todo\".")]
    TodoStartsInFuture,
    #[error("startDate must be today or in the past for status \"In Progress\".")]
    InProgressHasStarted,
    #[error("startDate and dueDate must be in the past for status \"Completed\".")]
    CompletedInPast,
    #[error("dueDate must be in the past for status \"Expired\".")]
    ExpiredIsOverdue,
    #[error("estimatedTime must not be negative.")]
    EstimatedTimeNonNegative,
}

/// Schedule fields of a task as they would be after a create or update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub status: Status,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    /// `None` asks for the estimate to be derived from the dates.
    pub estimated_time: Option<f64>,
}

/// Schedule fields that passed every rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValidSchedule {
    pub status: Status,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub estimated_time: f64,
}

type Predicate = fn(&Candidate, DateTime<Utc>) -> bool;

/// Rules in evaluation order. A predicate returns `true` when satisfied.
const RULES: [(ValidationRule, Predicate); 7] = [
    (ValidationRule::DatesRequired, dates_present),
    (ValidationRule::DueAfterStart, due_after_start),
    (ValidationRule::TodoStartsInFuture, todo_starts_in_future),
    (ValidationRule::InProgressHasStarted, in_progress_has_started),
    (ValidationRule::CompletedInPast, completed_in_past),
    (ValidationRule::ExpiredIsOverdue, expired_is_overdue),
    (ValidationRule::EstimatedTimeNonNegative, estimate_non_negative),
];

impl ValidationRule {
    /// Returns `true` when `candidate` satisfies this rule at `now`.
    pub fn is_satisfied_by(&self, candidate: &Candidate, now: DateTime<Utc>) -> bool {
        RULES
            .iter()
            .find(|(rule, _)| rule == self)
            .is_none_or(|(_, predicate)| predicate(candidate, now))
    }
}

/// Returns the first rule `candidate` breaks at `now`, if any.
pub fn first_violation(candidate: &Candidate, now: DateTime<Utc>) -> Option<ValidationRule> {
    RULES
        .iter()
        .find(|(_, predicate)| !predicate(candidate, now))
        .map(|(rule, _)| *rule)
}

/// Checks `candidate` against every rule and normalizes it.
///
/// A missing estimate is derived with [`derive_estimated_time`].
pub fn validate(candidate: &Candidate, now: DateTime<Utc>) -> Result<ValidSchedule, ValidationRule> {
    if let Some(rule) = first_violation(candidate, now) {
        return Err(rule);
    }
    let (Some(start_date), Some(due_date)) = (candidate.start_date, candidate.due_date) else {
        return Err(ValidationRule::DatesRequired);
    };
    Ok(ValidSchedule {
        status: candidate.status,
        start_date,
        due_date,
        estimated_time: candidate
            .estimated_time
            .unwrap_or_else(|| derive_estimated_time(start_date, due_date)),
    })
}

/// Whole hours between `start_date` and `due_date`, rounded up.
pub fn derive_estimated_time(start_date: DateTime<Utc>, due_date: DateTime<Utc>) -> f64 {
    let millis = (due_date - start_date).num_milliseconds() as f64;
    (millis / MILLIS_PER_HOUR).ceil()
}

const MILLIS_PER_HOUR: f64 = 60.0 * 60.0 * 1000.0;

fn dates(candidate: &Candidate) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    candidate.start_date.zip(candidate.due_date)
}

fn dates_present(candidate: &Candidate, _now: DateTime<Utc>) -> bool {
    dates(candidate).is_some()
}

fn due_after_start(candidate: &Candidate, _now: DateTime<Utc>) -> bool {
    dates(candidate).is_none_or(|(start, due)| due > start)
}

fn todo_starts_in_future(candidate: &Candidate, now: DateTime<Utc>) -> bool {
    candidate.status != Status::Todo || dates(candidate).is_none_or(|(start, _)| start > now)
}

fn in_progress_has_started(candidate: &Candidate, now: DateTime<Utc>) -> bool {
    candidate.status != Status::InProgress || dates(candidate).is_none_or(|(start, _)| start <= now)
}

fn completed_in_past(candidate: &Candidate, now: DateTime<Utc>) -> bool {
    candidate.status != Status::Completed
        || dates(candidate).is_none_or(|(start, due)| start <= now && due <= now)
}

fn expired_is_overdue(candidate: &Candidate, now: DateTime<Utc>) -> bool {
    candidate.status != Status::Expired || dates(candidate).is_none_or(|(_, due)| due < now)
}

fn estimate_non_negative(candidate: &Candidate, _now: DateTime<Utc>) -> bool {
    candidate.estimated_time.is_none_or(|hours| hours >= 0.0)
}
