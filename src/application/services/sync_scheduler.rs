use crate::application::ports::local_store::LocalStore;
use crate::application::ports::outbox::SyncOutbox;
use crate::application::ports::remote_store::RemoteStore;
use crate::application::services::connectivity::ConnectivityMonitor;
use crate::domain::entities::{QueueEntry, Record};
use crate::domain::value_objects::{Operation, Table};
use crate::shared::error::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: bool,
}

/// Drains the outbox toward the remote store in bounded per-table batches.
/// Gated by the connectivity flag and a reentrancy guard: a drain already in
/// progress suppresses the next tick instead of overlapping it.
pub struct SyncScheduler {
    outbox: Arc<dyn SyncOutbox>,
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    batch_size: u32,
    gate: Mutex<()>,
}

impl SyncScheduler {
    pub fn new(
        outbox: Arc<dyn SyncOutbox>,
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        batch_size: u32,
    ) -> Self {
        Self {
            outbox,
            local,
            remote,
            connectivity,
            batch_size,
            gate: Mutex::new(()),
        }
    }

    pub async fn run_once(&self) -> Result<DrainReport> {
        if !self.connectivity.is_online() {
            return Ok(DrainReport {
                skipped: true,
                ..DrainReport::default()
            });
        }

        let Ok(_guard) = self.gate.try_lock() else {
            return Ok(DrainReport {
                skipped: true,
                ..DrainReport::default()
            });
        };

        let mut report = DrainReport::default();
        for table in Table::ALL {
            let entries = self.outbox.dequeue_batch(table, self.batch_size).await?;
            for entry in entries {
                report.attempted += 1;
                // Entries are independent: one failure never blocks the rest
                match self.apply_entry(&entry).await {
                    Ok(()) => {
                        self.outbox.mark_completed(entry.id).await?;
                        report.completed += 1;
                    }
                    Err(err) => {
                        warn!(
                            target: "sync::scheduler",
                            entry_id = entry.id,
                            table = %entry.table,
                            operation = %entry.operation,
                            record_id = %entry.record_id,
                            error = %err,
                            "outbox entry apply failed"
                        );
                        self.outbox.mark_failed(entry.id, &err.to_string()).await?;
                        report.failed += 1;
                    }
                }
            }
        }

        if report.attempted > 0 {
            info!(
                target: "sync::scheduler",
                attempted = report.attempted,
                completed = report.completed,
                failed = report.failed,
                "outbox drain finished"
            );
        }
        Ok(report)
    }

    async fn apply_entry(&self, entry: &QueueEntry) -> Result<()> {
        match entry.operation {
            Operation::Insert | Operation::Update => {
                let record = self.record_to_push(entry).await?;
                self.remote.upsert(entry.table, &[record]).await
            }
            Operation::Delete => self.remote.delete(entry.table, &entry.record_id).await,
        }
    }

    /// Pushes the current local state when the record still exists (it is
    /// the last local write and supersedes the snapshot); falls back to the
    /// enqueue-time snapshot when the record has since been deleted locally,
    /// so the pending delete entry behind it still applies cleanly.
    async fn record_to_push(&self, entry: &QueueEntry) -> Result<Record> {
        if let Some(current) = self.local.get_by_id(entry.table, &entry.record_id).await? {
            return Ok(current);
        }

        let payload = entry
            .payload
            .clone()
            .ok_or_else(|| {
                crate::shared::error::SyncError::Internal(format!(
                    "entry {} has no payload snapshot",
                    entry.id
                ))
            })?;
        Ok(Record::new(
            entry.table,
            entry.record_id.clone(),
            payload,
            entry.enqueued_at,
            entry.enqueued_at,
        ))
    }
}
