use crate::application::ports::clock::Clock;
use crate::application::ports::local_store::{ListOptions, LocalStore, RecordFilter};
use crate::application::ports::outbox::SyncOutbox;
use crate::domain::entities::{QueueEntryDraft, Record, RecordDraft};
use crate::domain::value_objects::{Operation, RecordId, Table};
use crate::shared::error::{Result, SyncError};
use std::sync::Arc;
use tracing::warn;

/// The storage API consumed by all domain services. Writes commit to the
/// local store synchronously and never touch the network; each successful
/// mutation appends exactly one outbox entry.
///
/// Failure policy: local-store errors abort the call and propagate to the
/// caller. Outbox append errors are logged and swallowed — sync lags for
/// that record, but the local write stands.
pub struct StorageService {
    local: Arc<dyn LocalStore>,
    outbox: Arc<dyn SyncOutbox>,
    clock: Arc<dyn Clock>,
}

impl StorageService {
    pub fn new(
        local: Arc<dyn LocalStore>,
        outbox: Arc<dyn SyncOutbox>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            local,
            outbox,
            clock,
        }
    }

    pub async fn save_record(
        &self,
        table: Table,
        draft: RecordDraft,
        operation: Operation,
    ) -> Result<Record> {
        if operation == Operation::Delete {
            return Err(SyncError::Validation(
                "save_record accepts insert or update; use delete_record".to_string(),
            ));
        }

        draft
            .payload
            .validate_against(table.schema())
            .map_err(SyncError::Validation)?;

        let id = match (draft.id, operation) {
            (Some(id), _) => id,
            (None, Operation::Insert) => RecordId::generate(),
            (None, _) => {
                return Err(SyncError::Validation(
                    "update requires a record id".to_string(),
                ));
            }
        };

        let now = self.clock.now();
        let existing = self.local.get_by_id(table, &id).await?;

        // Keep updated_at non-decreasing per id even under clock skew.
        let (created_at, updated_at) = match &existing {
            Some(previous) => (previous.created_at, now.max(previous.updated_at)),
            None => (now, now),
        };

        let record = Record::new(table, id, draft.payload, created_at, updated_at);
        self.local.upsert(&record).await?;

        let entry = QueueEntryDraft::new(
            table,
            operation,
            record.id.clone(),
            Some(record.payload.clone()),
        )
        .map_err(SyncError::Internal)?;
        self.enqueue_best_effort(entry).await;

        Ok(record)
    }

    pub async fn get_record_by_id(&self, table: Table, id: &RecordId) -> Result<Option<Record>> {
        self.local.get_by_id(table, id).await
    }

    pub async fn get_records(
        &self,
        table: Table,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<Record>> {
        self.local.list(table, filter, options).await
    }

    pub async fn delete_record(&self, table: Table, id: &RecordId) -> Result<bool> {
        let removed = self.local.delete(table, id).await?;
        if !removed {
            return Ok(false);
        }

        let entry = QueueEntryDraft::new(table, Operation::Delete, id.clone(), None)
            .map_err(SyncError::Internal)?;
        self.enqueue_best_effort(entry).await;

        Ok(true)
    }

    async fn enqueue_best_effort(&self, draft: QueueEntryDraft) {
        let table = draft.table;
        let operation = draft.operation;
        let record_id = draft.record_id.clone();
        if let Err(err) = self.outbox.enqueue(draft).await {
            warn!(
                target: "storage",
                table = %table,
                operation = %operation,
                record_id = %record_id,
                error = %err,
                "outbox enqueue failed; local write stands, sync will lag"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::clock::ManualClock;
    use crate::application::ports::outbox::QueueCounts;
    use crate::domain::entities::QueueEntry;
    use crate::domain::value_objects::{QueueStatus, RecordPayload};
    use crate::infrastructure::database::{SqliteLocalStore, SqliteOutbox};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> (StorageService, Arc<SqliteOutbox>, Arc<ManualClock>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let clock = Arc::new(ManualClock::new(
            Utc.timestamp_millis_opt(1_000).unwrap(),
        ));
        let outbox = Arc::new(SqliteOutbox::new(pool.clone(), 3, clock.clone()));
        let service = StorageService::new(
            Arc::new(SqliteLocalStore::new(pool)),
            outbox.clone(),
            clock.clone(),
        );
        (service, outbox, clock)
    }

    fn profile_draft(name: &str) -> RecordDraft {
        RecordDraft::new(None, RecordPayload::new(json!({ "name": name })).unwrap())
    }

    #[tokio::test]
    async fn test_save_produces_exactly_one_matching_queue_entry() {
        let (service, outbox, _) = setup().await;

        let record = service
            .save_record(Table::Profiles, profile_draft("main"), Operation::Insert)
            .await
            .unwrap();

        let batch = outbox.dequeue_batch(Table::Profiles, 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].operation, Operation::Insert);
        assert_eq!(batch[0].record_id, record.id);
        assert_eq!(batch[0].status, QueueStatus::Pending);
    }

    #[tokio::test]
    async fn test_invalid_payload_fails_without_queue_entry() {
        let (service, outbox, _) = setup().await;

        let draft = RecordDraft::new(None, RecordPayload::new(json!({ "nome": "typo" })).unwrap());
        let result = service
            .save_record(Table::Profiles, draft, Operation::Insert)
            .await;

        assert!(matches!(result, Err(SyncError::Validation(_))));
        assert_eq!(outbox.counts().await.unwrap(), QueueCounts::default());
    }

    #[tokio::test]
    async fn test_update_requires_id_and_keeps_created_at() {
        let (service, _, clock) = setup().await;

        let missing_id = service
            .save_record(Table::Profiles, profile_draft("x"), Operation::Update)
            .await;
        assert!(matches!(missing_id, Err(SyncError::Validation(_))));

        let created = service
            .save_record(Table::Profiles, profile_draft("x"), Operation::Insert)
            .await
            .unwrap();

        clock.advance(chrono::Duration::seconds(4));
        let updated = service
            .save_record(
                Table::Profiles,
                RecordDraft::new(Some(created.id.clone()), profile_draft("y").payload),
                Operation::Update,
            )
            .await
            .unwrap();

        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at.timestamp_millis(), 5_000);
    }

    #[tokio::test]
    async fn test_updated_at_never_decreases() {
        let (service, _, clock) = setup().await;

        clock.set(Utc.timestamp_millis_opt(9_000).unwrap());
        let created = service
            .save_record(Table::Profiles, profile_draft("a"), Operation::Insert)
            .await
            .unwrap();

        // Clock skew: time moves backwards between writes
        clock.set(Utc.timestamp_millis_opt(4_000).unwrap());
        let updated = service
            .save_record(
                Table::Profiles,
                RecordDraft::new(Some(created.id.clone()), profile_draft("b").payload),
                Operation::Update,
            )
            .await
            .unwrap();

        assert_eq!(updated.updated_at.timestamp_millis(), 9_000);
    }

    #[tokio::test]
    async fn test_delete_enqueues_only_for_existing_records() {
        let (service, outbox, _) = setup().await;

        let record = service
            .save_record(Table::Proxies, proxy_draft(), Operation::Insert)
            .await
            .unwrap();

        assert!(service.delete_record(Table::Proxies, &record.id).await.unwrap());
        assert!(!service.delete_record(Table::Proxies, &record.id).await.unwrap());

        let batch = outbox.dequeue_batch(Table::Proxies, 10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1].operation, Operation::Delete);
        assert!(batch[1].payload.is_none());
    }

    fn proxy_draft() -> RecordDraft {
        RecordDraft::new(
            None,
            RecordPayload::new(json!({ "host": "10.0.0.1", "port": 8080 })).unwrap(),
        )
    }

    struct BrokenOutbox;

    #[async_trait]
    impl SyncOutbox for BrokenOutbox {
        async fn enqueue(&self, _draft: QueueEntryDraft) -> Result<QueueEntry> {
            Err(SyncError::QueueEnqueue("disk full".to_string()))
        }
        async fn dequeue_batch(&self, _table: Table, _limit: u32) -> Result<Vec<QueueEntry>> {
            Ok(vec![])
        }
        async fn mark_completed(&self, _entry_id: i64) -> Result<()> {
            Ok(())
        }
        async fn mark_failed(&self, _entry_id: i64, _error: &str) -> Result<()> {
            Ok(())
        }
        async fn counts(&self) -> Result<QueueCounts> {
            Ok(QueueCounts::default())
        }
    }

    #[tokio::test]
    async fn test_enqueue_failure_never_fails_the_write() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let local = Arc::new(SqliteLocalStore::new(pool));
        let service = StorageService::new(
            local.clone(),
            Arc::new(BrokenOutbox),
            Arc::new(ManualClock::new(Utc::now())),
        );

        let record = service
            .save_record(Table::Profiles, profile_draft("main"), Operation::Insert)
            .await
            .expect("local write must stand");

        let loaded = local
            .get_by_id(Table::Profiles, &record.id)
            .await
            .unwrap();
        assert!(loaded.is_some());
    }
}
