use crate::domain::entities::{QueueEntry, Record};
use crate::domain::value_objects::{Operation, QueueStatus, RecordId, RecordPayload, Table};
use crate::shared::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow)]
pub struct RecordRow {
    pub id: String,
    pub payload: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl RecordRow {
    pub fn into_record(self, table: Table) -> Result<Record> {
        let id = RecordId::new(self.id).map_err(SyncError::Internal)?;
        let payload = RecordPayload::from_json_str(&self.payload).map_err(SyncError::Internal)?;
        Ok(Record::new(
            table,
            id,
            payload,
            timestamp_to_datetime(self.created_at),
            timestamp_to_datetime(self.updated_at),
        ))
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SyncQueueRow {
    pub id: i64,
    pub table_name: String,
    pub operation: String,
    pub record_id: String,
    pub payload: Option<String>,
    pub status: String,
    pub retry_count: i32,
    pub max_retries: i32,
    pub enqueued_at: i64,
    pub updated_at: i64,
    pub error_message: Option<String>,
}

impl SyncQueueRow {
    pub fn into_entry(self) -> Result<QueueEntry> {
        let table = Table::parse(&self.table_name).map_err(SyncError::Internal)?;
        let operation = Operation::parse(&self.operation).map_err(SyncError::Internal)?;
        let record_id = RecordId::new(self.record_id).map_err(SyncError::Internal)?;
        let payload = self
            .payload
            .as_deref()
            .map(RecordPayload::from_json_str)
            .transpose()
            .map_err(SyncError::Internal)?;

        Ok(QueueEntry {
            id: self.id,
            table,
            operation,
            record_id,
            payload,
            status: QueueStatus::from(self.status.as_str()),
            retries: self.retry_count,
            max_retries: self.max_retries,
            enqueued_at: timestamp_to_datetime(self.enqueued_at),
            updated_at: timestamp_to_datetime(self.updated_at),
            last_error: self.error_message,
        })
    }
}

/// Timestamps are persisted as unix milliseconds; fall back to seconds for
/// rows written by older builds.
pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .or_else(|| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now)
}
