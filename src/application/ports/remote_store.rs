use crate::domain::entities::Record;
use crate::domain::value_objects::{RecordId, Table};
use crate::shared::error::Result;
use async_trait::async_trait;

/// Scope for remote pulls. An unset owner means the whole table.
#[derive(Debug, Clone, Default)]
pub struct RemoteFilter {
    pub owner_id: Option<String>,
}

impl RemoteFilter {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
        }
    }
}

/// Adapter contract for the cloud-hosted authoritative store. Upserts are
/// keyed by record id and must be idempotent: redelivering an
/// already-applied entry produces no observable change.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upsert(&self, table: Table, records: &[Record]) -> Result<()>;
    async fn delete(&self, table: Table, id: &RecordId) -> Result<()>;
    async fn select(&self, table: Table, filter: &RemoteFilter) -> Result<Vec<Record>>;
    async fn count(&self, table: Table, filter: &RemoteFilter) -> Result<i64>;

    /// Lightweight reachability probe used by the connectivity monitor.
    async fn ping(&self) -> Result<()>;
}
