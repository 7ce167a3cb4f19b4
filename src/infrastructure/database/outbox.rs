use crate::application::ports::clock::Clock;
use crate::application::ports::outbox::{QueueCounts, SyncOutbox};
use crate::domain::entities::{QueueEntry, QueueEntryDraft};
use crate::domain::value_objects::Table;
use crate::infrastructure::database::connection::DbPool;
use crate::infrastructure::database::rows::SyncQueueRow;
use crate::shared::error::{Result, SyncError};
use async_trait::async_trait;
use std::sync::Arc;

/// SQLite-backed outbox over the `sync_queue` table. The retry cap is
/// stamped into each row at enqueue time, so changing the configuration
/// affects new entries only.
pub struct SqliteOutbox {
    pool: DbPool,
    max_retries: i32,
    clock: Arc<dyn Clock>,
}

impl SqliteOutbox {
    pub fn new(pool: DbPool, max_retries: i32, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            max_retries,
            clock,
        }
    }

    async fn get_entry(&self, entry_id: i64) -> Result<QueueEntry> {
        let row = sqlx::query_as::<_, SyncQueueRow>("SELECT * FROM sync_queue WHERE id = ?1")
            .bind(entry_id)
            .fetch_one(&self.pool)
            .await?;
        row.into_entry()
    }
}

#[async_trait]
impl SyncOutbox for SqliteOutbox {
    async fn enqueue(&self, draft: QueueEntryDraft) -> Result<QueueEntry> {
        let payload = draft
            .payload
            .as_ref()
            .map(|payload| serde_json::to_string(payload.as_json()))
            .transpose()?;
        let now = self.clock.now().timestamp_millis();

        let result = sqlx::query(
            r#"
            INSERT INTO sync_queue (
                table_name, operation, record_id, payload,
                status, retry_count, max_retries, enqueued_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 'pending', 0, ?5, ?6, ?6)
            "#,
        )
        .bind(draft.table.as_str())
        .bind(draft.operation.as_str())
        .bind(draft.record_id.as_str())
        .bind(&payload)
        .bind(self.max_retries)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|err| SyncError::QueueEnqueue(err.to_string()))?;

        self.get_entry(result.last_insert_rowid()).await
    }

    async fn dequeue_batch(&self, table: Table, limit: u32) -> Result<Vec<QueueEntry>> {
        let rows = sqlx::query_as::<_, SyncQueueRow>(
            r#"
            SELECT * FROM sync_queue
            WHERE table_name = ?1 AND status = 'pending'
            ORDER BY id ASC
            LIMIT ?2
            "#,
        )
        .bind(table.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SyncQueueRow::into_entry).collect()
    }

    async fn mark_completed(&self, entry_id: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sync_queue
            SET status = 'completed', error_message = NULL, updated_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(self.clock.now().timestamp_millis())
        .bind(entry_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_failed(&self, entry_id: i64, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sync_queue
            SET retry_count = retry_count + 1,
                status = CASE
                    WHEN retry_count + 1 >= max_retries THEN 'failed'
                    ELSE 'pending'
                END,
                error_message = ?1,
                updated_at = ?2
            WHERE id = ?3
            "#,
        )
        .bind(error)
        .bind(self.clock.now().timestamp_millis())
        .bind(entry_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn counts(&self) -> Result<QueueCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM sync_queue GROUP BY status")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = QueueCounts::default();
        for (status, count) in rows {
            match status.as_str() {
                "pending" => counts.pending = count,
                "completed" => counts.completed = count,
                "failed" => counts.failed = count,
                _ => {}
            }
        }
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::clock::ManualClock;
    use crate::domain::value_objects::{Operation, QueueStatus, RecordId, RecordPayload};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_outbox_with(max_retries: i32, clock: Arc<ManualClock>) -> SqliteOutbox {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();
        SqliteOutbox::new(pool, max_retries, clock)
    }

    async fn setup_outbox() -> SqliteOutbox {
        setup_outbox_with(3, Arc::new(ManualClock::new(Utc::now()))).await
    }

    fn insert_draft(table: Table, id: &str) -> QueueEntryDraft {
        QueueEntryDraft::new(
            table,
            Operation::Insert,
            RecordId::new(id.to_string()).unwrap(),
            Some(RecordPayload::new(json!({ "name": id })).unwrap()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_enqueue_returns_pending_entry() {
        let outbox = setup_outbox().await;
        let entry = outbox.enqueue(insert_draft(Table::Profiles, "p1")).await.unwrap();

        assert_eq!(entry.status, QueueStatus::Pending);
        assert_eq!(entry.retries, 0);
        assert_eq!(entry.max_retries, 3);
        assert_eq!(entry.record_id.as_str(), "p1");
        assert!(entry.payload.is_some());
    }

    #[tokio::test]
    async fn test_dequeue_is_per_table_and_fifo() {
        let outbox = setup_outbox().await;
        outbox.enqueue(insert_draft(Table::Profiles, "p1")).await.unwrap();
        outbox.enqueue(insert_draft(Table::Proxies, "x1")).await.unwrap();
        outbox.enqueue(insert_draft(Table::Profiles, "p2")).await.unwrap();

        let batch = outbox.dequeue_batch(Table::Profiles, 10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].record_id.as_str(), "p1");
        assert_eq!(batch[1].record_id.as_str(), "p2");

        let limited = outbox.dequeue_batch(Table::Profiles, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].record_id.as_str(), "p1");
    }

    #[tokio::test]
    async fn test_completed_entries_are_retained_not_dequeued() {
        let outbox = setup_outbox().await;
        let entry = outbox.enqueue(insert_draft(Table::Profiles, "p1")).await.unwrap();

        outbox.mark_completed(entry.id).await.unwrap();

        assert!(outbox.dequeue_batch(Table::Profiles, 10).await.unwrap().is_empty());
        let counts = outbox.counts().await.unwrap();
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.pending, 0);
    }

    #[tokio::test]
    async fn test_three_failures_reach_terminal_failed() {
        let outbox = setup_outbox().await;
        let entry = outbox.enqueue(insert_draft(Table::Campaigns, "c5")).await.unwrap();

        outbox.mark_failed(entry.id, "boom 1").await.unwrap();
        outbox.mark_failed(entry.id, "boom 2").await.unwrap();

        // Still pending after two failures
        let batch = outbox.dequeue_batch(Table::Campaigns, 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].retries, 2);
        assert_eq!(batch[0].last_error.as_deref(), Some("boom 2"));

        outbox.mark_failed(entry.id, "boom 3").await.unwrap();

        assert!(outbox.dequeue_batch(Table::Campaigns, 10).await.unwrap().is_empty());
        let counts = outbox.counts().await.unwrap();
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.pending, 0);
    }

    #[tokio::test]
    async fn test_configured_retry_cap_is_stamped_and_enforced() {
        let outbox = setup_outbox_with(1, Arc::new(ManualClock::new(Utc::now()))).await;
        let entry = outbox.enqueue(insert_draft(Table::Profiles, "p1")).await.unwrap();
        assert_eq!(entry.max_retries, 1);

        outbox.mark_failed(entry.id, "boom").await.unwrap();

        assert!(outbox.dequeue_batch(Table::Profiles, 10).await.unwrap().is_empty());
        let counts = outbox.counts().await.unwrap();
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.pending, 0);
    }

    #[tokio::test]
    async fn test_timestamps_come_from_the_injected_clock() {
        let clock = Arc::new(ManualClock::new(Utc.timestamp_millis_opt(42_000).unwrap()));
        let outbox = setup_outbox_with(3, clock.clone()).await;

        let entry = outbox.enqueue(insert_draft(Table::Profiles, "p1")).await.unwrap();
        assert_eq!(entry.enqueued_at.timestamp_millis(), 42_000);
        assert_eq!(entry.updated_at.timestamp_millis(), 42_000);

        clock.set(Utc.timestamp_millis_opt(43_000).unwrap());
        outbox.mark_failed(entry.id, "boom").await.unwrap();
        let batch = outbox.dequeue_batch(Table::Profiles, 10).await.unwrap();
        assert_eq!(batch[0].updated_at.timestamp_millis(), 43_000);
        assert_eq!(batch[0].enqueued_at.timestamp_millis(), 42_000);
    }
}
