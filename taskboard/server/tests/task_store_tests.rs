use chrono::{DateTime, Duration, Utc};
use sea_orm::{DbErr, SqlErr};
use taskboard_server::entities::sea_orm_active_enums::{Priority, Status};
use taskboard_server::task::store::{
    NewTaskRecord, SeaOrmTaskStore, SortBy, TaskChanges, TaskQuery, TaskStore,
};

mod common;

use common::fixed_now;

async fn setup() -> SeaOrmTaskStore {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let db = common::setup_db().await.expect("Failed to setup database");
    SeaOrmTaskStore::new(db)
}

fn record(user_id: &str, name: &str, start: DateTime<Utc>, due: DateTime<Utc>) -> NewTaskRecord {
    NewTaskRecord {
        user_id: user_id.to_string(),
        name: name.to_string(),
        description: None,
        priority: Priority::Medium,
        status: Status::Todo,
        estimated_time: 4.0,
        start_date: start,
        due_date: due,
        created_at: fixed_now(),
    }
}

fn no_changes() -> TaskChanges {
    TaskChanges {
        name: None,
        description: None,
        priority: None,
        status: None,
        estimated_time: None,
        start_date: None,
        due_date: None,
        updated_at: fixed_now() + Duration::hours(1),
    }
}

#[tokio::test]
async fn can_create_and_find_task() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);

    let created = store
        .create_task(record("user-1", "Write report", start, start + Duration::hours(4)))
        .await
        .expect("Failed to create task");

    let found = store
        .find_task_by_id("user-1", created.id)
        .await
        .expect("Failed to find task");
    assert_eq!(found, Some(created.clone()));
    assert_eq!(created.status, Status::Todo);
    assert_eq!(created.created_at, created.updated_at);
}

#[tokio::test]
async fn can_hide_tasks_of_other_users() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);
    let created = store
        .create_task(record("user-1", "Private", start, start + Duration::hours(1)))
        .await
        .expect("Failed to create task");

    let found = store
        .find_task_by_id("user-2", created.id)
        .await
        .expect("Failed to query task");
    let deleted = store
        .delete_task("user-2", created.id)
        .await
        .expect("Failed to query task");

    assert_eq!(found, None);
    assert_eq!(deleted, None);
}

#[tokio::test]
async fn can_reject_duplicate_name_for_same_user() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);
    store
        .create_task(record("user-1", "Same", start, start + Duration::hours(1)))
        .await
        .expect("Failed to create task");

    let result: Result<_, DbErr> = store
        .create_task(record("user-1", "Same", start, start + Duration::hours(2)))
        .await;

    let err = result.expect_err("Duplicate name should fail");
    assert!(matches!(
        err.sql_err(),
        Some(SqlErr::UniqueConstraintViolation(_))
    ));
}

#[tokio::test]
async fn can_reuse_name_across_users() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);
    store
        .create_task(record("user-1", "Shared", start, start + Duration::hours(1)))
        .await
        .expect("Failed to create task");

    let other = store
        .create_task(record("user-2", "Shared", start, start + Duration::hours(1)))
        .await;

    assert!(other.is_ok());
}

#[tokio::test]
async fn can_find_tasks_in_range() {
    let store = setup().await;
    let monday = fixed_now() - Duration::days(2) - Duration::hours(12);
    let inside = store
        .create_task(record("user-1", "Inside", monday + Duration::days(1), monday + Duration::days(2)))
        .await
        .expect("Failed to create task");
    store
        .create_task(record("user-1", "Before", monday - Duration::days(1), monday + Duration::days(1)))
        .await
        .expect("Failed to create task");
    store
        .create_task(record("user-1", "After", monday + Duration::days(6), monday + Duration::days(8)))
        .await
        .expect("Failed to create task");

    let tasks = store
        .find_tasks_in_range("user-1", monday, monday + Duration::days(7))
        .await
        .expect("Failed to query tasks");

    assert_eq!(tasks, vec![inside]);
}

#[tokio::test]
async fn can_filter_and_sort_tasks() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);
    let mut urgent = record("user-1", "Fix login bug", start, start + Duration::hours(2));
    urgent.priority = Priority::High;
    store.create_task(urgent).await.expect("Failed to create task");
    store
        .create_task(record("user-1", "Bug triage", start, start + Duration::hours(1)))
        .await
        .expect("Failed to create task");
    store
        .create_task(record("user-1", "Plan sprint", start, start + Duration::hours(3)))
        .await
        .expect("Failed to create task");

    let by_search = store
        .list_tasks(
            "user-1",
            &TaskQuery {
                search: Some("BUG".to_string()),
                sort_by: Some(SortBy::Name),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list tasks");
    let names: Vec<&str> = by_search.iter().map(|task| task.name.as_str()).collect();
    assert_eq!(names, vec!["Bug triage", "Fix login bug"]);

    let by_priority = store
        .list_tasks(
            "user-1",
            &TaskQuery {
                priority: Some(Priority::High),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list tasks");
    assert_eq!(by_priority.len(), 1);
    assert_eq!(by_priority[0].name, "Fix login bug");

    let by_due_date = store
        .list_tasks(
            "user-1",
            &TaskQuery {
                sort_by: Some(SortBy::DueDate),
                ..Default::default()
            },
        )
        .await
        .expect("Failed to list tasks");
    let names: Vec<&str> = by_due_date.iter().map(|task| task.name.as_str()).collect();
    assert_eq!(names, vec!["Bug triage", "Fix login bug", "Plan sprint"]);
}

#[tokio::test]
async fn can_update_only_changed_fields() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);
    let created = store
        .create_task(record("user-1", "Draft", start, start + Duration::hours(4)))
        .await
        .expect("Failed to create task");

    let updated = store
        .update_task(
            "user-1",
            created.id,
            TaskChanges {
                name: Some("Final".to_string()),
                status: Some(Status::InProgress),
                ..no_changes()
            },
        )
        .await
        .expect("Failed to update task")
        .expect("Task should exist");

    assert_eq!(updated.name, "Final");
    assert_eq!(updated.status, Status::InProgress);
    assert_eq!(updated.priority, created.priority);
    assert_eq!(updated.start_date, created.start_date);
    assert_eq!(updated.updated_at, fixed_now() + Duration::hours(1));
}

#[tokio::test]
async fn can_clear_description() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);
    let mut with_notes = record("user-1", "Notes", start, start + Duration::hours(1));
    with_notes.description = Some("draft".to_string());
    let created = store.create_task(with_notes).await.expect("Failed to create task");

    let updated = store
        .update_task(
            "user-1",
            created.id,
            TaskChanges {
                description: Some(None),
                ..no_changes()
            },
        )
        .await
        .expect("Failed to update task")
        .expect("Task should exist");

    assert_eq!(updated.description, None);
    assert_eq!(updated.name, "Notes");
}

#[tokio::test]
async fn can_report_missing_task_on_update() {
    let store = setup().await;

    let updated = store
        .update_task("user-1", 999, no_changes())
        .await
        .expect("Failed to query task");

    assert_eq!(updated, None);
}

#[tokio::test]
async fn can_delete_task() {
    let store = setup().await;
    let start = fixed_now() + Duration::days(1);
    let created = store
        .create_task(record("user-1", "Temporary", start, start + Duration::hours(1)))
        .await
        .expect("Failed to create task");

    let deleted = store
        .delete_task("user-1", created.id)
        .await
        .expect("Failed to delete task");
    let found = store
        .find_task_by_id("user-1", created.id)
        .await
        .expect("Failed to query task");

    assert_eq!(deleted, Some(created));
    assert_eq!(found, None);
}
