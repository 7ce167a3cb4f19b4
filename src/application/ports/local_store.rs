use crate::domain::entities::Record;
use crate::domain::value_objects::{RecordId, Table};
use crate::shared::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Equality filters over payload fields, ANDed together.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub fields: Vec<(String, Value)>,
}

impl RecordFilter {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.push((name.into(), value));
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    CreatedAt,
    UpdatedAt,
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub order_by: OrderBy,
    pub descending: bool,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            order_by: OrderBy::UpdatedAt,
            descending: true,
            limit: None,
            offset: None,
        }
    }
}

/// Durable keyed storage over the fixed table set. All operations are
/// atomic for a single record; writes serialize against one internal write
/// path. Implementations never touch the outbox — enqueueing is the storage
/// service's concern, which is what lets the reconciler pull remote state
/// into the store without generating echo entries.
#[async_trait]
pub trait LocalStore: Send + Sync {
    async fn upsert(&self, record: &Record) -> Result<()>;
    async fn get_by_id(&self, table: Table, id: &RecordId) -> Result<Option<Record>>;
    async fn list(
        &self,
        table: Table,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<Record>>;
    /// Returns true when a record was removed, false when the id was absent.
    async fn delete(&self, table: Table, id: &RecordId) -> Result<bool>;
    async fn count(&self, table: Table) -> Result<i64>;
}
