use crate::error::CoreError;
use crate::models::{
    DueNotification, NotificationStats, NotifyMethod, NotifyStatus, ScheduledNotification,
};
use crate::store::{now_local, NotificationQueue, SqliteStore};
use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime};
use uuid::Uuid;

const DEFAULT_MAX_RETRIES: i64 = 3;

#[async_trait]
impl NotificationQueue for SqliteStore {
    async fn schedule(
        &self,
        task_id: Uuid,
        fire_at: NaiveDateTime,
        method: NotifyMethod,
    ) -> Result<ScheduledNotification, CoreError> {
        let task_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(self.pool())
            .await?;
        if task_exists.is_none() {
            return Err(CoreError::NotFound(task_id.to_string()));
        }

        let notification = ScheduledNotification {
            id: Uuid::now_v7(),
            task_id: Some(task_id),
            title: None,
            body: None,
            scheduled_at: fire_at,
            method,
            status: NotifyStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            last_error: None,
            sent_at: None,
            acknowledged_at: None,
        };
        self.insert_notification(&notification).await?;
        Ok(notification)
    }

    async fn schedule_custom(
        &self,
        title: &str,
        body: &str,
        fire_at: NaiveDateTime,
        method: NotifyMethod,
    ) -> Result<ScheduledNotification, CoreError> {
        if title.trim().is_empty() {
            return Err(CoreError::Validation(
                "notification title cannot be empty".into(),
            ));
        }

        let notification = ScheduledNotification {
            id: Uuid::now_v7(),
            task_id: None,
            title: Some(title.to_string()),
            body: Some(body.to_string()),
            scheduled_at: fire_at,
            method,
            status: NotifyStatus::Pending,
            retry_count: 0,
            max_retries: DEFAULT_MAX_RETRIES,
            last_error: None,
            sent_at: None,
            acknowledged_at: None,
        };
        self.insert_notification(&notification).await?;
        Ok(notification)
    }

    async fn find_notification(
        &self,
        id: Uuid,
    ) -> Result<Option<ScheduledNotification>, CoreError> {
        let notification = sqlx::query_as("SELECT * FROM notification_queue WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(notification)
    }

    async fn list_pending(&self) -> Result<Vec<ScheduledNotification>, CoreError> {
        let notifications = sqlx::query_as(
            r#"SELECT * FROM notification_queue
            WHERE status IN ('pending', 'snoozed')
            ORDER BY scheduled_at ASC
            "#,
        )
        .fetch_all(self.pool())
        .await?;
        Ok(notifications)
    }

    async fn cancel(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM notification_queue WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn snooze(&self, id: Uuid, new_time: NaiveDateTime) -> Result<(), CoreError> {
        // Snoozing always grants a fresh retry budget, whatever the prior
        // state was.
        let result = sqlx::query(
            r#"UPDATE notification_queue
            SET scheduled_at = $1, status = 'snoozed', retry_count = 0, last_error = NULL
            WHERE id = $2
            "#,
        )
        .bind(new_time)
        .bind(id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn acknowledge(&self, id: Uuid) -> Result<(), CoreError> {
        let notification: ScheduledNotification =
            sqlx::query_as("SELECT * FROM notification_queue WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool())
                .await?
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        match notification.status {
            NotifyStatus::Sent | NotifyStatus::Failed => {
                sqlx::query(
                    r#"UPDATE notification_queue
                    SET status = 'acknowledged', acknowledged_at = $1
                    WHERE id = $2
                    "#,
                )
                .bind(now_local())
                .bind(id)
                .execute(self.pool())
                .await?;
                Ok(())
            }
            NotifyStatus::Acknowledged => Ok(()),
            other => Err(CoreError::Validation(format!(
                "cannot acknowledge a {} notification",
                other
            ))),
        }
    }

    async fn due_batch(
        &self,
        now: NaiveDateTime,
        limit: u32,
    ) -> Result<Vec<DueNotification>, CoreError> {
        let batch = sqlx::query_as(
            r#"SELECT n.id, n.task_id, n.method, n.retry_count, n.max_retries,
                n.title AS custom_title, n.body AS custom_body,
                t.title AS task_title, t.description AS task_description
            FROM notification_queue n
            LEFT JOIN tasks t ON n.task_id = t.id
            WHERE n.status IN ('pending', 'snoozed') AND n.scheduled_at <= $1
            ORDER BY n.scheduled_at ASC
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool())
        .await?;
        Ok(batch)
    }

    async fn record_outcome(
        &self,
        id: Uuid,
        outcome: Result<(), String>,
        now: NaiveDateTime,
    ) -> Result<(), CoreError> {
        match outcome {
            Ok(()) => {
                sqlx::query(
                    r#"UPDATE notification_queue
                    SET status = 'sent', sent_at = $1, last_error = NULL
                    WHERE id = $2
                    "#,
                )
                .bind(now)
                .bind(id)
                .execute(self.pool())
                .await?;
            }
            Err(error) => {
                // Exhausting the chain is terminal: no automatic
                // rescheduling, only an explicit snooze revives the row.
                // retry_count stays capped at max_retries; sent_at records
                // the attempt time for both outcomes.
                sqlx::query(
                    r#"UPDATE notification_queue
                    SET retry_count = MIN(retry_count + 1, max_retries),
                        status = 'failed',
                        sent_at = $1,
                        last_error = $2
                    WHERE id = $3
                    "#,
                )
                .bind(now)
                .bind(error)
                .bind(id)
                .execute(self.pool())
                .await?;
            }
        }
        Ok(())
    }

    async fn notification_stats(
        &self,
        now: NaiveDateTime,
    ) -> Result<NotificationStats, CoreError> {
        let day_ago = now - Duration::days(1);

        let row: (i64, i64, i64, i64) = sqlx::query_as(
            r#"SELECT
                (SELECT COUNT(*) FROM notification_queue WHERE status = 'pending'),
                (SELECT COUNT(*) FROM notification_queue WHERE status = 'snoozed'),
                (SELECT COUNT(*) FROM notification_queue
                    WHERE status = 'sent' AND sent_at > $1),
                (SELECT COUNT(*) FROM notification_queue
                    WHERE status = 'failed' AND sent_at > $1)
            "#,
        )
        .bind(day_ago)
        .fetch_one(self.pool())
        .await?;

        let last_error: Option<(String,)> = sqlx::query_as(
            r#"SELECT last_error FROM notification_queue
            WHERE last_error IS NOT NULL
            ORDER BY sent_at DESC LIMIT 1
            "#,
        )
        .fetch_optional(self.pool())
        .await?;

        Ok(NotificationStats {
            pending: row.0,
            snoozed: row.1,
            sent_last_24h: row.2,
            failed_last_24h: row.3,
            last_error: last_error.map(|(e,)| e),
        })
    }
}

impl SqliteStore {
    async fn insert_notification(
        &self,
        n: &ScheduledNotification,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO notification_queue (id, task_id, title, body, scheduled_at,
                method, status, retry_count, max_retries, last_error, sent_at,
                acknowledged_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(n.id)
        .bind(n.task_id)
        .bind(&n.title)
        .bind(&n.body)
        .bind(n.scheduled_at)
        .bind(n.method)
        .bind(n.status)
        .bind(n.retry_count)
        .bind(n.max_retries)
        .bind(&n.last_error)
        .bind(n.sent_at)
        .bind(n.acknowledged_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}
