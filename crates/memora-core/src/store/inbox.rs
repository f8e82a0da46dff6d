use crate::error::CoreError;
use crate::models::InboxItem;
use crate::store::{now_local, InboxStore, SqliteStore};
use async_trait::async_trait;
use uuid::Uuid;

const INBOX_LIST_LIMIT: u32 = 50;

#[async_trait]
impl InboxStore for SqliteStore {
    async fn capture(&self, content: &str, source: &str) -> Result<InboxItem, CoreError> {
        if content.trim().is_empty() {
            return Err(CoreError::Validation("inbox content cannot be empty".into()));
        }

        let item = InboxItem {
            id: Uuid::now_v7(),
            content: content.to_string(),
            captured_at: now_local(),
            processed: false,
            processed_task_id: None,
            source: if source.is_empty() { "cli".to_string() } else { source.to_string() },
        };

        sqlx::query(
            r#"INSERT INTO inbox (id, content, captured_at, processed, processed_task_id, source)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(&item.content)
        .bind(item.captured_at)
        .bind(item.processed)
        .bind(item.processed_task_id)
        .bind(&item.source)
        .execute(self.pool())
        .await?;

        Ok(item)
    }

    async fn list_unprocessed(&self) -> Result<Vec<InboxItem>, CoreError> {
        let items = sqlx::query_as(
            r#"SELECT * FROM inbox WHERE processed = 0
            ORDER BY captured_at DESC LIMIT $1
            "#,
        )
        .bind(INBOX_LIST_LIMIT)
        .fetch_all(self.pool())
        .await?;
        Ok(items)
    }

    async fn process_item(&self, inbox_id: Uuid, task_id: Uuid) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        // processed implies the linked task exists.
        let task_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tasks WHERE id = $1")
            .bind(task_id)
            .fetch_optional(&mut *tx)
            .await?;
        if task_exists.is_none() {
            return Err(CoreError::NotFound(task_id.to_string()));
        }

        let result = sqlx::query(
            "UPDATE inbox SET processed = 1, processed_task_id = $1 WHERE id = $2",
        )
        .bind(task_id)
        .bind(inbox_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(inbox_id.to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete_item(&self, inbox_id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM inbox WHERE id = $1")
            .bind(inbox_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(inbox_id.to_string()));
        }
        Ok(())
    }
}
