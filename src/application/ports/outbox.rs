use crate::domain::entities::{QueueEntry, QueueEntryDraft};
use crate::domain::value_objects::Table;
use crate::shared::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: i64,
    pub completed: i64,
    pub failed: i64,
}

/// Durable, ordered log of pending mutations. Entries are drained oldest
/// first per table and are retained after reaching a terminal state.
#[async_trait]
pub trait SyncOutbox: Send + Sync {
    async fn enqueue(&self, draft: QueueEntryDraft) -> Result<QueueEntry>;

    /// Pending entries for one table, oldest first, excluding entries whose
    /// retry budget is exhausted.
    async fn dequeue_batch(&self, table: Table, limit: u32) -> Result<Vec<QueueEntry>>;

    async fn mark_completed(&self, entry_id: i64) -> Result<()>;

    /// Increments the retry counter; once it reaches the entry's cap the
    /// entry transitions to terminal `failed` and is never dequeued again.
    async fn mark_failed(&self, entry_id: i64, error: &str) -> Result<()>;

    async fn counts(&self) -> Result<QueueCounts>;
}
