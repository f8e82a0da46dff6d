use crate::error::CoreError;
use crate::models::{
    NewTaskData, Task, TaskFilter, TaskPriority, TaskStats, TaskStatus, UpdateTaskData,
};
use crate::store::{now_local, SqliteStore, TaskStore};
use async_trait::async_trait;
use chrono::Duration;
use sqlx::QueryBuilder;
use uuid::Uuid;

const DEFAULT_LIST_LIMIT: u32 = 100;
const SEARCH_LIMIT: u32 = 50;

/// Quote every whitespace-separated token so user input can never be
/// interpreted as FTS5 query syntax (NEAR, AND, column filters, ...).
fn fts_quote(query: &str) -> String {
    query
        .split_whitespace()
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

#[async_trait]
impl TaskStore for SqliteStore {
    async fn add_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        if data.title.trim().is_empty() {
            return Err(CoreError::Validation("task title cannot be empty".into()));
        }

        let now = now_local();
        let task = Task {
            id: Uuid::now_v7(),
            title: data.title,
            description: data.description,
            priority: data.priority.unwrap_or(TaskPriority::Normal),
            status: TaskStatus::Pending,
            due_date: data.due_date,
            reminder_at: data.reminder_at,
            recurrence: data.recurrence.unwrap_or(crate::models::Recurrence::None),
            recurrence_rule: data.recurrence_rule,
            tags: data.tags,
            context: data.context,
            parent_id: data.parent_id,
            source: data.source.unwrap_or_else(|| "cli".to_string()),
            external_id: data.external_id,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        sqlx::query(
            r#"INSERT INTO tasks (id, title, description, priority, status, due_date,
                reminder_at, recurrence, recurrence_rule, tags, context, parent_id,
                source, external_id, created_at, updated_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.status)
        .bind(task.due_date)
        .bind(task.reminder_at)
        .bind(task.recurrence)
        .bind(&task.recurrence_rule)
        .bind(&task.tags)
        .bind(&task.context)
        .bind(task.parent_id)
        .bind(&task.source)
        .bind(&task.external_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.completed_at)
        .execute(self.pool())
        .await?;

        Ok(task)
    }

    async fn find_task_by_id(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        let task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(task)
    }

    async fn find_tasks_by_id_prefix(&self, prefix: &str) -> Result<Vec<Task>, CoreError> {
        // Ids are stored as 16-byte values; match the user-visible hex form.
        let cleaned: String = prefix
            .chars()
            .filter(|c| *c != '-')
            .collect::<String>()
            .to_uppercase();
        if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Vec::new());
        }

        let mut pattern = cleaned;
        pattern.push('%');

        let tasks = sqlx::query_as("SELECT * FROM tasks WHERE hex(id) LIKE $1")
            .bind(pattern)
            .fetch_all(self.pool())
            .await?;
        Ok(tasks)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        if let Some(title) = &data.title {
            if title.trim().is_empty() {
                return Err(CoreError::Validation("task title cannot be empty".into()));
            }
        }

        let mut tx = self.pool().begin().await?;

        let mut task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if let Some(title) = data.title {
            task.title = title;
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        if let Some(due_date) = data.due_date {
            task.due_date = due_date;
        }
        if let Some(reminder_at) = data.reminder_at {
            task.reminder_at = reminder_at;
        }
        if let Some(recurrence) = data.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(recurrence_rule) = data.recurrence_rule {
            task.recurrence_rule = recurrence_rule;
        }
        if let Some(tags) = data.tags {
            task.tags = tags;
        }
        if let Some(context) = data.context {
            task.context = context;
        }
        if let Some(parent_id) = data.parent_id {
            task.parent_id = parent_id;
        }
        if let Some(external_id) = data.external_id {
            task.external_id = external_id;
        }
        task.updated_at = now_local();

        sqlx::query(
            r#"UPDATE tasks SET title = $1, description = $2, priority = $3,
                due_date = $4, reminder_at = $5, recurrence = $6, recurrence_rule = $7,
                tags = $8, context = $9, parent_id = $10, external_id = $11,
                updated_at = $12
            WHERE id = $13
            "#,
        )
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(task.reminder_at)
        .bind(task.recurrence)
        .bind(&task.recurrence_rule)
        .bind(&task.tags)
        .bind(&task.context)
        .bind(task.parent_id)
        .bind(&task.external_id)
        .bind(task.updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(task)
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn complete_task(&self, id: Uuid) -> Result<Task, CoreError> {
        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        match task.status {
            // Idempotent: a second completion keeps the original timestamps.
            TaskStatus::Completed => Ok(task),
            TaskStatus::Cancelled => Err(CoreError::Validation(
                "cannot complete a cancelled task".into(),
            )),
            TaskStatus::Pending | TaskStatus::InProgress => {
                let now = now_local();
                let completed: Task = sqlx::query_as(
                    r#"UPDATE tasks SET status = $1, completed_at = $2, updated_at = $2
                    WHERE id = $3
                    RETURNING *
                    "#,
                )
                .bind(TaskStatus::Completed)
                .bind(now)
                .bind(id)
                .fetch_one(self.pool())
                .await?;
                Ok(completed)
            }
        }
    }

    async fn uncomplete_task(&self, id: Uuid) -> Result<Task, CoreError> {
        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if task.status != TaskStatus::Completed {
            return Err(CoreError::Validation(
                "only a completed task can be uncompleted".into(),
            ));
        }

        let reopened: Task = sqlx::query_as(
            r#"UPDATE tasks SET status = $1, completed_at = NULL, updated_at = $2
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(TaskStatus::Pending)
        .bind(now_local())
        .bind(id)
        .fetch_one(self.pool())
        .await?;
        Ok(reopened)
    }

    async fn start_task(&self, id: Uuid) -> Result<Task, CoreError> {
        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if task.status.is_terminal() {
            return Err(CoreError::Validation(format!(
                "cannot start a {} task",
                task.status
            )));
        }

        let started: Task = sqlx::query_as(
            r#"UPDATE tasks SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *"#,
        )
        .bind(TaskStatus::InProgress)
        .bind(now_local())
        .bind(id)
        .fetch_one(self.pool())
        .await?;
        Ok(started)
    }

    async fn cancel_task(&self, id: Uuid) -> Result<Task, CoreError> {
        let task: Task = sqlx::query_as("SELECT * FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        match task.status {
            TaskStatus::Cancelled => Ok(task),
            TaskStatus::Completed => Err(CoreError::Validation(
                "cannot cancel a completed task".into(),
            )),
            TaskStatus::Pending | TaskStatus::InProgress => {
                let cancelled: Task = sqlx::query_as(
                    r#"UPDATE tasks SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *"#,
                )
                .bind(TaskStatus::Cancelled)
                .bind(now_local())
                .bind(id)
                .fetch_one(self.pool())
                .await?;
                Ok(cancelled)
            }
        }
    }

    async fn find_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, CoreError> {
        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT * FROM tasks WHERE 1=1");

        match (filter.include_completed, filter.include_cancelled) {
            (false, false) => {
                builder.push(" AND status IN ('pending', 'in_progress')");
            }
            (false, true) => {
                builder.push(" AND status != 'completed'");
            }
            (true, false) => {
                builder.push(" AND status != 'cancelled'");
            }
            (true, true) => {}
        }

        if let Some(context) = &filter.context {
            builder.push(" AND context = ");
            builder.push_bind(context.as_str());
        }
        if let Some(due_from) = filter.due_from {
            builder.push(" AND due_date >= ");
            builder.push_bind(due_from);
        }
        if let Some(due_to) = filter.due_to {
            builder.push(" AND due_date <= ");
            builder.push_bind(due_to);
        }

        builder.push(" ORDER BY priority ASC, due_date ASC LIMIT ");
        builder.push_bind(filter.limit.unwrap_or(DEFAULT_LIST_LIMIT));
        if let Some(offset) = filter.offset {
            builder.push(" OFFSET ");
            builder.push_bind(offset);
        }

        let tasks = builder.build_query_as().fetch_all(self.pool()).await?;
        Ok(tasks)
    }

    async fn list_today(&self) -> Result<Vec<Task>, CoreError> {
        // Anything without a due date counts as "today" so quick captures
        // stay visible, matching the default dashboard view.
        let tomorrow_start = (now_local().date() + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid");

        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE status IN ('pending', 'in_progress')
              AND (due_date IS NULL OR due_date < $1)
            ORDER BY priority ASC, due_date ASC LIMIT $2
            "#,
        )
        .bind(tomorrow_start)
        .bind(DEFAULT_LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn list_overdue(&self) -> Result<Vec<Task>, CoreError> {
        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE status IN ('pending', 'in_progress')
              AND due_date IS NOT NULL AND due_date < $1
            ORDER BY due_date ASC LIMIT $2
            "#,
        )
        .bind(now_local())
        .bind(DEFAULT_LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn list_upcoming(&self, days: u32) -> Result<Vec<Task>, CoreError> {
        let window_end = (now_local().date() + Duration::days(i64::from(days) + 1))
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid");

        let tasks = sqlx::query_as(
            r#"SELECT * FROM tasks
            WHERE status IN ('pending', 'in_progress')
              AND due_date IS NOT NULL AND due_date < $1
            ORDER BY due_date ASC LIMIT $2
            "#,
        )
        .bind(window_end)
        .bind(DEFAULT_LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn search(&self, query: &str) -> Result<Vec<Task>, CoreError> {
        let quoted = fts_quote(query);
        if quoted.is_empty() {
            return Ok(Vec::new());
        }

        let tasks = sqlx::query_as(
            r#"SELECT t.* FROM tasks t
            JOIN tasks_fts ON t.rowid = tasks_fts.rowid
            WHERE tasks_fts MATCH $1 AND t.status IN ('pending', 'in_progress')
            ORDER BY tasks_fts.rank LIMIT $2
            "#,
        )
        .bind(quoted)
        .bind(SEARCH_LIMIT)
        .fetch_all(self.pool())
        .await?;
        Ok(tasks)
    }

    async fn task_stats(&self) -> Result<TaskStats, CoreError> {
        let now = now_local();
        let today_start = now
            .date()
            .and_hms_opt(0, 0, 0)
            .expect("midnight is always valid");
        let week_start = today_start - Duration::days(7);

        let row: (i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            r#"SELECT
                (SELECT COUNT(*) FROM tasks WHERE status = 'pending'),
                (SELECT COUNT(*) FROM tasks WHERE status = 'in_progress'),
                (SELECT COUNT(*) FROM tasks WHERE status = 'completed' AND completed_at >= $1),
                (SELECT COUNT(*) FROM tasks WHERE status = 'completed' AND completed_at >= $2),
                (SELECT COUNT(*) FROM tasks
                    WHERE status IN ('pending', 'in_progress')
                      AND due_date IS NOT NULL AND due_date < $3),
                (SELECT COUNT(*) FROM inbox WHERE processed = 0)
            "#,
        )
        .bind(today_start)
        .bind(week_start)
        .bind(now)
        .fetch_one(self.pool())
        .await?;

        Ok(TaskStats {
            pending: row.0,
            in_progress: row.1,
            completed_today: row.2,
            completed_week: row.3,
            overdue: row.4,
            inbox_unprocessed: row.5,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::fts_quote;

    #[test]
    fn fts_quote_wraps_tokens() {
        assert_eq!(fts_quote("water plants"), "\"water\" \"plants\"");
    }

    #[test]
    fn fts_quote_neutralizes_operators() {
        assert_eq!(fts_quote("a AND b"), "\"a\" \"AND\" \"b\"");
        assert_eq!(fts_quote("title:x"), "\"title:x\"");
    }

    #[test]
    fn fts_quote_escapes_embedded_quotes() {
        assert_eq!(fts_quote("say \"hi\""), "\"say\" \"\"\"hi\"\"\"");
    }

    #[test]
    fn fts_quote_empty_input() {
        assert_eq!(fts_quote("   "), "");
    }
}
