use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    /// Completed and cancelled rows are invisible to search and the
    /// default listings.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task status: {0}")]
pub struct ParseTaskStatusError(String);

impl FromStr for TaskStatus {
    type Err = ParseTaskStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "in_progress" => Ok(TaskStatus::InProgress),
            "completed" => Ok(TaskStatus::Completed),
            "cancelled" => Ok(TaskStatus::Cancelled),
            _ => Err(ParseTaskStatusError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Stored as INTEGER so that `ORDER BY priority ASC` ranks urgent first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum TaskPriority {
    Urgent = 1,
    Normal = 2,
    Low = 3,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "urgent" | "1" => Ok(TaskPriority::Urgent),
            "normal" | "2" => Ok(TaskPriority::Normal),
            "low" | "3" => Ok(TaskPriority::Low),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPriority::Urgent => write!(f, "urgent"),
            TaskPriority::Normal => write!(f, "normal"),
            TaskPriority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    None,
    Daily,
    Weekly,
    Monthly,
    /// Interpreted through `recurrence_rule` as an RFC 5545 RRULE.
    Custom,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence kind: {0}")]
pub struct ParseRecurrenceError(String);

impl FromStr for Recurrence {
    type Err = ParseRecurrenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Recurrence::None),
            "daily" => Ok(Recurrence::Daily),
            "weekly" => Ok(Recurrence::Weekly),
            "monthly" => Ok(Recurrence::Monthly),
            "custom" => Ok(Recurrence::Custom),
            _ => Err(ParseRecurrenceError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDateTime>,
    pub reminder_at: Option<NaiveDateTime>,
    pub recurrence: Recurrence,
    pub recurrence_rule: Option<String>,
    /// Comma-separated tag list, mirroring the column layout.
    pub tags: Option<String>,
    pub context: Option<String>,
    pub parent_id: Option<Uuid>,
    pub source: String,
    pub external_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDateTime>,
    pub reminder_at: Option<NaiveDateTime>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_rule: Option<String>,
    pub tags: Option<String>,
    pub context: Option<String>,
    pub parent_id: Option<Uuid>,
    pub source: Option<String>,
    pub external_id: Option<String>,
}

/// Partial update; `Option<Option<_>>` distinguishes "leave unchanged"
/// from "clear the field".
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDateTime>>,
    pub reminder_at: Option<Option<NaiveDateTime>>,
    pub recurrence: Option<Recurrence>,
    pub recurrence_rule: Option<Option<String>>,
    pub tags: Option<Option<String>>,
    pub context: Option<Option<String>>,
    pub parent_id: Option<Option<Uuid>>,
    pub external_id: Option<Option<String>>,
}

/// Row selection for `find_tasks`. Terminal statuses are excluded unless
/// explicitly included.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub include_completed: bool,
    pub include_cancelled: bool,
    pub context: Option<String>,
    pub due_from: Option<NaiveDateTime>,
    pub due_to: Option<NaiveDateTime>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Aggregate counters over the task and inbox tables.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TaskStats {
    pub pending: i64,
    pub in_progress: i64,
    pub completed_today: i64,
    pub completed_week: i64,
    pub overdue: i64,
    pub inbox_unprocessed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InboxItem {
    pub id: Uuid,
    pub content: String,
    pub captured_at: NaiveDateTime,
    pub processed: bool,
    pub processed_task_id: Option<Uuid>,
    pub source: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotifyMethod {
    /// Walk the whole delivery chain, most capable transport first.
    Auto,
    Native,
    Desktop,
    Terminal,
    Sound,
    Log,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid notification method: {0}")]
pub struct ParseNotifyMethodError(String);

impl FromStr for NotifyMethod {
    type Err = ParseNotifyMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(NotifyMethod::Auto),
            "native" => Ok(NotifyMethod::Native),
            "desktop" => Ok(NotifyMethod::Desktop),
            "terminal" => Ok(NotifyMethod::Terminal),
            "sound" => Ok(NotifyMethod::Sound),
            "log" => Ok(NotifyMethod::Log),
            _ => Err(ParseNotifyMethodError(s.to_string())),
        }
    }
}

impl std::fmt::Display for NotifyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyMethod::Auto => write!(f, "auto"),
            NotifyMethod::Native => write!(f, "native"),
            NotifyMethod::Desktop => write!(f, "desktop"),
            NotifyMethod::Terminal => write!(f, "terminal"),
            NotifyMethod::Sound => write!(f, "sound"),
            NotifyMethod::Log => write!(f, "log"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotifyStatus {
    Pending,
    Sent,
    Failed,
    Acknowledged,
    Snoozed,
}

impl std::fmt::Display for NotifyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyStatus::Pending => write!(f, "pending"),
            NotifyStatus::Sent => write!(f, "sent"),
            NotifyStatus::Failed => write!(f, "failed"),
            NotifyStatus::Acknowledged => write!(f, "acknowledged"),
            NotifyStatus::Snoozed => write!(f, "snoozed"),
        }
    }
}

/// A persisted intent to deliver one reminder. Lifecycle is independent of
/// the linked task; `task_id` is NULL for custom notifications, which carry
/// their own `title`/`body`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduledNotification {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub scheduled_at: NaiveDateTime,
    pub method: NotifyMethod,
    pub status: NotifyStatus,
    pub retry_count: i64,
    pub max_retries: i64,
    pub last_error: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub acknowledged_at: Option<NaiveDateTime>,
}

/// A due queue row joined with its task's title and description, ready for
/// the daemon to render and deliver.
#[derive(Debug, Clone, FromRow)]
pub struct DueNotification {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub method: NotifyMethod,
    pub retry_count: i64,
    pub max_retries: i64,
    pub custom_title: Option<String>,
    pub custom_body: Option<String>,
    pub task_title: Option<String>,
    pub task_description: Option<String>,
}

/// Persisted delivery counters, derived from queue rows so they survive
/// daemon restarts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationStats {
    pub pending: i64,
    pub snoozed: i64,
    pub sent_last_24h: i64,
    pub failed_last_24h: i64,
    pub last_error: Option<String>,
}
