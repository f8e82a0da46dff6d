use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{
    DueNotification, InboxItem, NewTaskData, NotificationStats, NotifyMethod,
    ScheduledNotification, Task, TaskFilter, TaskStats, UpdateTaskData,
};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use uuid::Uuid;

pub mod inbox;
pub mod notifications;
pub mod tasks;

/// Local-naive "now", the storage layer's single clock. Timestamps are
/// always bound from here rather than computed with SQL `datetime('now')`,
/// which is UTC and would disagree with the parser's local output domain.
pub(crate) fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Domain trait for task CRUD, listing and search.
#[async_trait]
pub trait TaskStore {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    async fn find_tasks_by_id_prefix(&self, prefix: &str) -> Result<Vec<Task>, CoreError>;
    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError>;
    async fn complete_task(&self, id: Uuid) -> Result<Task, CoreError>;
    async fn uncomplete_task(&self, id: Uuid) -> Result<Task, CoreError>;
    async fn start_task(&self, id: Uuid) -> Result<Task, CoreError>;
    async fn cancel_task(&self, id: Uuid) -> Result<Task, CoreError>;
    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError>;
    async fn list_today(&self) -> Result<Vec<Task>, CoreError>;
    async fn list_overdue(&self) -> Result<Vec<Task>, CoreError>;
    async fn list_upcoming(&self, days: u32) -> Result<Vec<Task>, CoreError>;
    async fn search(&self, query: &str) -> Result<Vec<Task>, CoreError>;
    async fn task_stats(&self) -> Result<TaskStats, CoreError>;
}

/// Domain trait for the quick-capture inbox.
#[async_trait]
pub trait InboxStore {
    async fn capture(&self, content: &str, source: &str) -> Result<InboxItem, CoreError>;
    async fn list_unprocessed(&self) -> Result<Vec<InboxItem>, CoreError>;
    async fn process_item(&self, inbox_id: Uuid, task_id: Uuid) -> Result<(), CoreError>;
    async fn delete_item(&self, inbox_id: Uuid) -> Result<(), CoreError>;
}

/// Domain trait for the persisted notification queue and its state machine.
#[async_trait]
pub trait NotificationQueue {
    async fn schedule(
        &self,
        task_id: Uuid,
        fire_at: NaiveDateTime,
        method: NotifyMethod,
    ) -> Result<ScheduledNotification, CoreError>;
    async fn schedule_custom(
        &self,
        title: &str,
        body: &str,
        fire_at: NaiveDateTime,
        method: NotifyMethod,
    ) -> Result<ScheduledNotification, CoreError>;
    async fn find_notification(&self, id: Uuid)
        -> Result<Option<ScheduledNotification>, CoreError>;
    async fn list_pending(&self) -> Result<Vec<ScheduledNotification>, CoreError>;
    async fn cancel(&self, id: Uuid) -> Result<(), CoreError>;
    async fn snooze(&self, id: Uuid, new_time: NaiveDateTime) -> Result<(), CoreError>;
    async fn acknowledge(&self, id: Uuid) -> Result<(), CoreError>;
    /// Due pending/snoozed rows joined with task title/description, fire
    /// time ascending, bounded by `limit`.
    async fn due_batch(
        &self,
        now: NaiveDateTime,
        limit: u32,
    ) -> Result<Vec<DueNotification>, CoreError>;
    /// Idempotent per-row writeback of one delivery attempt, keyed by
    /// notification id. Success marks the row sent; failure either burns a
    /// retry (row stays pending) or, with the budget exhausted, marks it
    /// failed with `last_error`.
    async fn record_outcome(
        &self,
        id: Uuid,
        outcome: Result<(), String>,
        now: NaiveDateTime,
    ) -> Result<(), CoreError>;
    async fn notification_stats(&self, now: NaiveDateTime)
        -> Result<NotificationStats, CoreError>;
}

/// Composed store trait: one object serving every domain.
pub trait Store: TaskStore + InboxStore + NotificationQueue + Send + Sync {}

/// SQLite implementation over a shared connection pool. The pool preserves
/// the single-writer discipline (SQLite serializes writers; WAL lets
/// readers proceed) without a process-wide lock held across application
/// logic.
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Store for SqliteStore {}
