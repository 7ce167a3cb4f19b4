use crate::domain::value_objects::{RecordId, RecordPayload, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single synchronized record. `updated_at` is non-decreasing across
/// successive writes to the same id and is the sole conflict-resolution
/// signal between the local and remote stores.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    pub table: Table,
    pub id: RecordId,
    pub payload: RecordPayload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(
        table: Table,
        id: RecordId,
        payload: RecordPayload,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            table,
            id,
            payload,
            created_at,
            updated_at,
        }
    }

    /// True when `other` carries a strictly newer version of the same
    /// record. Equal timestamps are not "newer": last-write-wins merges
    /// treat them as a no-op with the local side retained.
    pub fn is_older_than(&self, other: &Record) -> bool {
        self.updated_at < other.updated_at
    }
}

/// Caller-supplied input for a write. The id is optional for inserts; the
/// storage service assigns a generated one when absent.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub id: Option<RecordId>,
    pub payload: RecordPayload,
}

impl RecordDraft {
    pub fn new(id: Option<RecordId>, payload: RecordPayload) -> Self {
        Self { id, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record_at(ts: i64) -> Record {
        Record::new(
            Table::Profiles,
            RecordId::new("p1".to_string()).unwrap(),
            RecordPayload::from_json_str(r#"{"name":"a"}"#).unwrap(),
            Utc.timestamp_opt(ts, 0).unwrap(),
            Utc.timestamp_opt(ts, 0).unwrap(),
        )
    }

    #[test]
    fn strictly_newer_wins_equal_does_not() {
        let older = record_at(100);
        let newer = record_at(200);
        assert!(older.is_older_than(&newer));
        assert!(!newer.is_older_than(&older));
        assert!(!older.is_older_than(&record_at(100)));
    }
}
