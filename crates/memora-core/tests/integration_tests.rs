use chrono::{Duration, Local};
use memora_core::daemon::{Daemon, PidFile};
use memora_core::db::establish_connection;
use memora_core::error::CoreError;
use memora_core::models::*;
use memora_core::notify::{DeliveryChain, LogFile};
use memora_core::store::{InboxStore, NotificationQueue, SqliteStore, TaskStore};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Helper function to create a test database
async fn setup_test_db() -> (Arc<SqliteStore>, TempDir) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = establish_connection(&db_path.to_string_lossy())
        .await
        .expect("Failed to establish test database connection");

    (Arc::new(SqliteStore::new(pool)), temp_dir)
}

/// Helper function to create a test task
async fn create_test_task(store: &SqliteStore, title: &str) -> Task {
    store
        .add_task(NewTaskData {
            title: title.to_string(),
            description: Some(format!("Test task: {title}")),
            ..Default::default()
        })
        .await
        .expect("Failed to create test task")
}

fn now() -> chrono::NaiveDateTime {
    Local::now().naive_local()
}

/// A daemon wired to a log-only chain writing inside the temp dir.
fn test_daemon(store: &Arc<SqliteStore>, dir: &TempDir) -> Daemon {
    let chain = Arc::new(DeliveryChain::with_transports(vec![Box::new(
        LogFile::new(dir.path().join("notifications.log")),
    )]));
    Daemon::new(Arc::clone(store), chain)
        .with_pid_file(PidFile::new(dir.path().join("daemon.pid")))
}

// ============================================================================
// Task store
// ============================================================================

#[tokio::test]
async fn test_basic_task_crud_workflow() {
    let (store, _temp_dir) = setup_test_db().await;

    let task = store
        .add_task(NewTaskData {
            title: "Water the plants".to_string(),
            description: Some("Back garden too".to_string()),
            priority: Some(TaskPriority::Urgent),
            due_date: Some(now() + Duration::hours(4)),
            tags: Some("home,garden".to_string()),
            context: Some("home".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(task.title, "Water the plants");
    assert_eq!(task.status, TaskStatus::Pending);
    assert_eq!(task.priority, TaskPriority::Urgent);
    assert_eq!(task.source, "cli");
    assert!(task.completed_at.is_none());

    // every supplied field comes back from the store
    let fetched = store.find_task_by_id(task.id).await.unwrap().unwrap();
    assert_eq!(fetched.title, task.title);
    assert_eq!(fetched.description, task.description);
    assert_eq!(fetched.priority, task.priority);
    assert_eq!(fetched.due_date, task.due_date);
    assert_eq!(fetched.tags, task.tags);
    assert_eq!(fetched.context, task.context);
    assert_eq!(fetched.created_at, task.created_at);

    let updated = store
        .update_task(
            task.id,
            UpdateTaskData {
                title: Some("Water all the plants".to_string()),
                priority: Some(TaskPriority::Low),
                description: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Water all the plants");
    assert_eq!(updated.priority, TaskPriority::Low);
    assert_eq!(updated.description, None);
    assert!(updated.updated_at >= task.updated_at);

    store.delete_task(task.id).await.unwrap();
    assert!(store.find_task_by_id(task.id).await.unwrap().is_none());

    let result = store.delete_task(task.id).await;
    assert!(matches!(result, Err(CoreError::NotFound(_))));
}

#[tokio::test]
async fn test_title_validation() {
    let (store, _temp_dir) = setup_test_db().await;

    let result = store
        .add_task(NewTaskData {
            title: "   ".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(CoreError::Validation(_))));

    let task = create_test_task(&store, "Valid").await;
    let result = store
        .update_task(
            task.id,
            UpdateTaskData {
                title: Some(String::new()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_completion_is_idempotent() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Ship release").await;

    let completed = store.complete_task(task.id).await.unwrap();
    assert_eq!(completed.status, TaskStatus::Completed);
    let completed_at = completed.completed_at.expect("completed_at must be set");

    // a second completion changes nothing, including the timestamp
    let again = store.complete_task(task.id).await.unwrap();
    assert_eq!(again.status, TaskStatus::Completed);
    assert_eq!(again.completed_at, Some(completed_at));
    assert_eq!(again.updated_at, completed.updated_at);

    // uncomplete is the only way back to pending
    let reopened = store.uncomplete_task(task.id).await.unwrap();
    assert_eq!(reopened.status, TaskStatus::Pending);
    assert!(reopened.completed_at.is_none());
}

#[tokio::test]
async fn test_status_transition_rules() {
    let (store, _temp_dir) = setup_test_db().await;

    let task = create_test_task(&store, "Doomed").await;
    store.cancel_task(task.id).await.unwrap();
    // cancelled tasks cannot be completed
    assert!(matches!(
        store.complete_task(task.id).await,
        Err(CoreError::Validation(_))
    ));
    // cancelling again is a no-op
    let again = store.cancel_task(task.id).await.unwrap();
    assert_eq!(again.status, TaskStatus::Cancelled);
    // and uncomplete only applies to completed tasks
    assert!(matches!(
        store.uncomplete_task(task.id).await,
        Err(CoreError::Validation(_))
    ));

    let task = create_test_task(&store, "Active").await;
    let started = store.start_task(task.id).await.unwrap();
    assert_eq!(started.status, TaskStatus::InProgress);
    store.complete_task(task.id).await.unwrap();
    assert!(matches!(
        store.start_task(task.id).await,
        Err(CoreError::Validation(_))
    ));
    assert!(matches!(
        store.cancel_task(task.id).await,
        Err(CoreError::Validation(_))
    ));

    assert!(matches!(
        store.complete_task(Uuid::now_v7()).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_filtering_and_ordering() {
    let (store, _temp_dir) = setup_test_db().await;

    let soon = now() + Duration::hours(1);
    let later = now() + Duration::hours(8);

    store
        .add_task(NewTaskData {
            title: "Low, later".to_string(),
            priority: Some(TaskPriority::Low),
            due_date: Some(later),
            context: Some("work".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .add_task(NewTaskData {
            title: "Urgent, soon".to_string(),
            priority: Some(TaskPriority::Urgent),
            due_date: Some(soon),
            context: Some("work".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let cancelled = create_test_task(&store, "Cancelled").await;
    store.cancel_task(cancelled.id).await.unwrap();

    // priority ascending, urgent first; terminal rows excluded
    let tasks = store.find_tasks(&TaskFilter::default()).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert_eq!(tasks[0].title, "Urgent, soon");
    assert_eq!(tasks[1].title, "Low, later");

    let work_only = store
        .find_tasks(&TaskFilter {
            context: Some("work".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(work_only.len(), 2);

    let windowed = store
        .find_tasks(&TaskFilter {
            due_from: Some(now()),
            due_to: Some(now() + Duration::hours(2)),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(windowed.len(), 1);
    assert_eq!(windowed[0].title, "Urgent, soon");

    let with_terminal = store
        .find_tasks(&TaskFilter {
            include_cancelled: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(with_terminal.len(), 3);

    let limited = store
        .find_tasks(&TaskFilter {
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_dated_listings() {
    let (store, _temp_dir) = setup_test_db().await;

    store
        .add_task(NewTaskData {
            title: "Overdue".to_string(),
            due_date: Some(now() - Duration::hours(3)),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .add_task(NewTaskData {
            title: "Next week".to_string(),
            due_date: Some(now() + Duration::days(6)),
            ..Default::default()
        })
        .await
        .unwrap();
    store
        .add_task(NewTaskData {
            title: "Undated".to_string(),
            ..Default::default()
        })
        .await
        .unwrap();

    let overdue = store.list_overdue().await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].title, "Overdue");

    // today includes the overdue and the undated rows, not next week's
    let today: Vec<String> = store
        .list_today()
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.title)
        .collect();
    assert!(today.contains(&"Overdue".to_string()));
    assert!(today.contains(&"Undated".to_string()));
    assert!(!today.contains(&"Next week".to_string()));

    let upcoming = store.list_upcoming(7).await.unwrap();
    assert!(upcoming.iter().any(|t| t.title == "Next week"));
}

#[tokio::test]
async fn test_search_tracks_content_and_status() {
    let (store, _temp_dir) = setup_test_db().await;

    let groceries = store
        .add_task(NewTaskData {
            title: "Buy groceries".to_string(),
            description: Some("milk, eggs, flour".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    create_test_task(&store, "Unrelated chore").await;

    let hits = store.search("groceries").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, groceries.id);

    // description words are indexed too
    assert_eq!(store.search("flour").await.unwrap().len(), 1);

    // the index follows updates within the same transaction
    store
        .update_task(
            groceries.id,
            UpdateTaskData {
                title: Some("Buy provisions".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(store.search("groceries").await.unwrap().is_empty());
    assert_eq!(store.search("provisions").await.unwrap().len(), 1);

    // completed tasks never surface in search
    store.complete_task(groceries.id).await.unwrap();
    assert!(store.search("provisions").await.unwrap().is_empty());

    // FTS operators in user input are inert
    assert!(store.search("provisions AND chore").await.unwrap().is_empty());
    assert!(store.search("").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_short_id_prefix_resolution() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Find me").await;

    let prefix: String = task.id.simple().to_string()[..8].to_string();
    let matches = store.find_tasks_by_id_prefix(&prefix).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].id, task.id);

    assert!(store.find_tasks_by_id_prefix("zz").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_task_stats() {
    let (store, _temp_dir) = setup_test_db().await;

    create_test_task(&store, "Pending one").await;
    let active = create_test_task(&store, "Active one").await;
    store.start_task(active.id).await.unwrap();
    let done = create_test_task(&store, "Done one").await;
    store.complete_task(done.id).await.unwrap();
    store
        .add_task(NewTaskData {
            title: "Overdue one".to_string(),
            due_date: Some(now() - Duration::hours(1)),
            ..Default::default()
        })
        .await
        .unwrap();
    store.capture("triage me", "cli").await.unwrap();

    let stats = store.task_stats().await.unwrap();
    assert_eq!(stats.pending, 2);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.completed_today, 1);
    assert_eq!(stats.overdue, 1);
    assert_eq!(stats.inbox_unprocessed, 1);
}

// ============================================================================
// Inbox
// ============================================================================

#[tokio::test]
async fn test_inbox_capture_and_triage() {
    let (store, _temp_dir) = setup_test_db().await;

    let item = store.capture("call the dentist", "voice").await.unwrap();
    assert!(!item.processed);
    assert_eq!(item.source, "voice");

    let unprocessed = store.list_unprocessed().await.unwrap();
    assert_eq!(unprocessed.len(), 1);

    // processing requires a real task
    let missing = store.process_item(item.id, Uuid::now_v7()).await;
    assert!(matches!(missing, Err(CoreError::NotFound(_))));

    let task = create_test_task(&store, "Call the dentist").await;
    store.process_item(item.id, task.id).await.unwrap();

    // processed items never come back from the unprocessed listing
    assert!(store.list_unprocessed().await.unwrap().is_empty());

    let empty = store.capture("   ", "cli").await;
    assert!(matches!(empty, Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_inbox_delete() {
    let (store, _temp_dir) = setup_test_db().await;
    let item = store.capture("fleeting thought", "cli").await.unwrap();
    store.delete_item(item.id).await.unwrap();
    assert!(matches!(
        store.delete_item(item.id).await,
        Err(CoreError::NotFound(_))
    ));
}

// ============================================================================
// Notification queue
// ============================================================================

#[tokio::test]
async fn test_schedule_starts_pending() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Dentist").await;

    let n = store
        .schedule(task.id, now() + Duration::hours(1), NotifyMethod::Auto)
        .await
        .unwrap();
    assert_eq!(n.status, NotifyStatus::Pending);
    assert_eq!(n.retry_count, 0);
    assert!(n.sent_at.is_none());

    assert!(matches!(
        store
            .schedule(Uuid::now_v7(), now(), NotifyMethod::Auto)
            .await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_snooze_always_resets_retries() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Dentist").await;
    let n = store
        .schedule(task.id, now() - Duration::minutes(5), NotifyMethod::Auto)
        .await
        .unwrap();

    // drive the row into failed with a burned retry
    store
        .record_outcome(n.id, Err("boom".to_string()), now())
        .await
        .unwrap();
    let failed = store.find_notification(n.id).await.unwrap().unwrap();
    assert_eq!(failed.status, NotifyStatus::Failed);
    assert_eq!(failed.retry_count, 1);
    assert_eq!(failed.last_error.as_deref(), Some("boom"));

    let wake_at = now() + Duration::minutes(30);
    store.snooze(n.id, wake_at).await.unwrap();
    let snoozed = store.find_notification(n.id).await.unwrap().unwrap();
    assert_eq!(snoozed.status, NotifyStatus::Snoozed);
    assert_eq!(snoozed.retry_count, 0);
    assert!(snoozed.last_error.is_none());

    // a snoozed row becomes due again once its new time passes
    let due = store
        .due_batch(wake_at + Duration::minutes(1), 16)
        .await
        .unwrap();
    assert_eq!(due.len(), 1);
}

#[tokio::test]
async fn test_retry_count_never_exceeds_budget() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Dentist").await;
    let n = store
        .schedule(task.id, now(), NotifyMethod::Auto)
        .await
        .unwrap();

    for _ in 0..6 {
        store
            .record_outcome(n.id, Err("still down".to_string()), now())
            .await
            .unwrap();
    }
    let row = store.find_notification(n.id).await.unwrap().unwrap();
    assert!(row.retry_count <= row.max_retries);
    assert_eq!(row.status, NotifyStatus::Failed);
}

#[tokio::test]
async fn test_acknowledge_transitions() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Dentist").await;
    let n = store
        .schedule(task.id, now(), NotifyMethod::Auto)
        .await
        .unwrap();

    // pending rows cannot be acknowledged
    assert!(matches!(
        store.acknowledge(n.id).await,
        Err(CoreError::Validation(_))
    ));

    store.record_outcome(n.id, Ok(()), now()).await.unwrap();
    store.acknowledge(n.id).await.unwrap();
    let row = store.find_notification(n.id).await.unwrap().unwrap();
    assert_eq!(row.status, NotifyStatus::Acknowledged);
    assert!(row.acknowledged_at.is_some());

    // acknowledging twice is fine
    store.acknowledge(n.id).await.unwrap();
}

#[tokio::test]
async fn test_cancel_deletes_the_row() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Dentist").await;
    let n = store
        .schedule(task.id, now(), NotifyMethod::Auto)
        .await
        .unwrap();

    store.cancel(n.id).await.unwrap();
    assert!(store.find_notification(n.id).await.unwrap().is_none());
    assert!(matches!(
        store.cancel(n.id).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_due_batch_is_ordered_and_bounded() {
    let (store, _temp_dir) = setup_test_db().await;
    let task = create_test_task(&store, "Dentist").await;

    for minutes in [30, 10, 20] {
        store
            .schedule(task.id, now() - Duration::minutes(minutes), NotifyMethod::Auto)
            .await
            .unwrap();
    }
    store
        .schedule(task.id, now() + Duration::hours(1), NotifyMethod::Auto)
        .await
        .unwrap();

    let due = store.due_batch(now(), 16).await.unwrap();
    assert_eq!(due.len(), 3);

    let bounded = store.due_batch(now(), 2).await.unwrap();
    assert_eq!(bounded.len(), 2);
}

// ============================================================================
// Daemon end to end
// ============================================================================

#[tokio::test]
async fn test_scan_delivers_due_and_leaves_future_rows() {
    let (store, temp_dir) = setup_test_db().await;
    let daemon = test_daemon(&store, &temp_dir);

    let task = store
        .add_task(NewTaskData {
            title: "Take out the bins".to_string(),
            description: Some("green bin week".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    let due = store
        .schedule(task.id, now() - Duration::minutes(1), NotifyMethod::Auto)
        .await
        .unwrap();
    let future = store
        .schedule(task.id, now() + Duration::hours(2), NotifyMethod::Auto)
        .await
        .unwrap();

    let processed = daemon.scan_now().await;
    assert_eq!(processed, 1);

    let sent = store.find_notification(due.id).await.unwrap().unwrap();
    assert_eq!(sent.status, NotifyStatus::Sent);
    assert!(sent.sent_at.is_some());

    let untouched = store.find_notification(future.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, NotifyStatus::Pending);

    // the audit row is updated, never deleted
    assert!(store.find_notification(due.id).await.unwrap().is_some());

    let log = std::fs::read_to_string(temp_dir.path().join("notifications.log")).unwrap();
    assert!(log.contains("Take out the bins"));
    assert!(log.contains("green bin week"));
}

#[tokio::test]
async fn test_scan_delivers_custom_notifications() {
    let (store, temp_dir) = setup_test_db().await;
    let daemon = test_daemon(&store, &temp_dir);

    store
        .schedule_custom(
            "Stand up",
            "stretch your legs",
            now() - Duration::minutes(1),
            NotifyMethod::Auto,
        )
        .await
        .unwrap();

    assert_eq!(daemon.scan_now().await, 1);
    let log = std::fs::read_to_string(temp_dir.path().join("notifications.log")).unwrap();
    assert!(log.contains("Stand up"));
    assert!(log.contains("stretch your legs"));
}

#[tokio::test]
async fn test_scan_marks_failed_when_chain_exhausted() {
    let (store, temp_dir) = setup_test_db().await;
    // a chain with no transports can never deliver
    let chain = Arc::new(DeliveryChain::with_transports(vec![]));
    let daemon = Daemon::new(Arc::clone(&store), chain)
        .with_pid_file(PidFile::new(temp_dir.path().join("daemon.pid")));

    let task = create_test_task(&store, "Unreachable").await;
    let n = store
        .schedule(task.id, now() - Duration::minutes(1), NotifyMethod::Auto)
        .await
        .unwrap();

    daemon.scan_now().await;
    let row = store.find_notification(n.id).await.unwrap().unwrap();
    assert_eq!(row.status, NotifyStatus::Failed);
    assert!(row.last_error.is_some());
    assert_eq!(row.retry_count, 1);
}

#[tokio::test]
async fn test_daemon_lifecycle_is_idempotent() {
    let (store, temp_dir) = setup_test_db().await;
    let daemon = test_daemon(&store, &temp_dir);

    assert!(!daemon.status().await.running);

    daemon.start().await.unwrap();
    daemon.start().await.unwrap();
    let status = daemon.status().await;
    assert!(status.running);
    assert_eq!(status.pid, Some(std::process::id()));

    daemon.stop().await.unwrap();
    daemon.stop().await.unwrap();
    assert!(!daemon.status().await.running);

    // a fresh start acquires fresh loop state
    daemon.restart().await.unwrap();
    assert!(daemon.status().await.running);
    daemon.stop().await.unwrap();
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_counters_survive_daemon_restarts() {
    let (store, temp_dir) = setup_test_db().await;
    let chain = Arc::new(DeliveryChain::with_transports(vec![Box::new(
        LogFile::new(temp_dir.path().join("notifications.log")),
    )]));
    let daemon = Daemon::new(Arc::clone(&store), Arc::clone(&chain))
        .with_pid_file(PidFile::new(temp_dir.path().join("daemon.pid")));

    let task = create_test_task(&store, "Dentist").await;
    store
        .schedule(task.id, now() - Duration::minutes(1), NotifyMethod::Auto)
        .await
        .unwrap();
    store
        .schedule(task.id, now() + Duration::hours(1), NotifyMethod::Auto)
        .await
        .unwrap();
    daemon.scan_now().await;

    let monitor =
        memora_core::health::HealthMonitor::new(Arc::clone(&store), Arc::clone(&chain));

    // counters come from persisted rows, not daemon memory
    let snapshot = monitor.snapshot(&daemon.status().await).await.unwrap();
    assert_eq!(snapshot.sent_last_24h, 1);
    assert_eq!(snapshot.pending, 1);
    assert_eq!(snapshot.failed_last_24h, 0);
    assert!(!snapshot.daemon_running);
    assert_eq!(snapshot.active_method, NotifyMethod::Log);
}
