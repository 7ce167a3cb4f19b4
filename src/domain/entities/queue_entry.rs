use crate::domain::value_objects::{Operation, QueueStatus, RecordId, RecordPayload, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One durable outbox entry: a pending mutation awaiting propagation to the
/// remote store. Entries are created only by the local write path and change
/// state only through the sync scheduler:
///
/// pending --(apply ok)--> completed
/// pending --(apply err, retries < max)--> pending (retries + 1)
/// pending --(apply err, retries >= max)--> failed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub id: i64,
    pub table: Table,
    pub operation: Operation,
    pub record_id: RecordId,
    /// Payload snapshot taken at enqueue time. `None` for deletes.
    pub payload: Option<RecordPayload>,
    pub status: QueueStatus,
    pub retries: i32,
    pub max_retries: i32,
    pub enqueued_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_error: Option<String>,
}

/// Input for an outbox append, produced by the storage write path.
#[derive(Debug, Clone)]
pub struct QueueEntryDraft {
    pub table: Table,
    pub operation: Operation,
    pub record_id: RecordId,
    pub payload: Option<RecordPayload>,
}

impl QueueEntryDraft {
    pub fn new(
        table: Table,
        operation: Operation,
        record_id: RecordId,
        payload: Option<RecordPayload>,
    ) -> Result<Self, String> {
        if operation.carries_payload() && payload.is_none() {
            return Err(format!("{operation} entry requires a payload snapshot"));
        }
        if !operation.carries_payload() && payload.is_some() {
            return Err("Delete entry carries the record id only".to_string());
        }
        Ok(Self {
            table,
            operation,
            record_id,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> RecordPayload {
        RecordPayload::from_json_str(r#"{"name":"x"}"#).unwrap()
    }

    #[test]
    fn draft_enforces_payload_rules() {
        let id = RecordId::new("r1".to_string()).unwrap();
        assert!(QueueEntryDraft::new(
            Table::Profiles,
            Operation::Insert,
            id.clone(),
            Some(payload())
        )
        .is_ok());
        assert!(
            QueueEntryDraft::new(Table::Profiles, Operation::Update, id.clone(), None).is_err()
        );
        assert!(QueueEntryDraft::new(Table::Profiles, Operation::Delete, id.clone(), None).is_ok());
        assert!(
            QueueEntryDraft::new(Table::Profiles, Operation::Delete, id, Some(payload())).is_err()
        );
    }
}
