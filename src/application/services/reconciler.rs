use crate::application::ports::local_store::{ListOptions, LocalStore, OrderBy, RecordFilter};
use crate::application::ports::remote_store::{RemoteFilter, RemoteStore};
use crate::application::services::connectivity::ConnectivityMonitor;
use crate::domain::entities::Record;
use crate::domain::value_objects::Table;
use crate::shared::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Local-only records pushed to the remote store.
    pub pushed: usize,
    /// Remote-only records inserted locally.
    pub pulled: usize,
    /// Records where the remote side was strictly newer and overwrote local.
    pub refreshed_local: usize,
    /// Records where the local side was strictly newer and overwrote remote.
    pub refreshed_remote: usize,
    pub remote_errors: usize,
    pub skipped: bool,
}

/// Bidirectional merge pass between the local and remote stores. Per
/// record, the strictly greater `updated_at` wins in either direction;
/// equal timestamps are a deliberate no-op with the local side retained.
/// Pull-driven writes go straight to the local store and never produce
/// outbox entries.
pub struct Reconciler {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    scope: RemoteFilter,
    gate: Mutex<()>,
}

impl Reconciler {
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        scope: RemoteFilter,
    ) -> Self {
        Self {
            local,
            remote,
            connectivity,
            scope,
            gate: Mutex::new(()),
        }
    }

    pub async fn run_once(&self) -> Result<ReconcileReport> {
        if !self.connectivity.is_online() {
            return Ok(ReconcileReport {
                skipped: true,
                ..ReconcileReport::default()
            });
        }

        let Ok(_guard) = self.gate.try_lock() else {
            return Ok(ReconcileReport {
                skipped: true,
                ..ReconcileReport::default()
            });
        };

        let mut report = ReconcileReport::default();
        for table in Table::ALL {
            if let Err(err) = self.reconcile_table(table, &mut report).await {
                if err.is_remote() {
                    warn!(
                        target: "sync::reconciler",
                        table = %table,
                        error = %err,
                        "reconcile pass skipped table, remote unavailable"
                    );
                    report.remote_errors += 1;
                } else {
                    return Err(err);
                }
            }
        }

        info!(
            target: "sync::reconciler",
            pushed = report.pushed,
            pulled = report.pulled,
            refreshed_local = report.refreshed_local,
            refreshed_remote = report.refreshed_remote,
            remote_errors = report.remote_errors,
            "reconcile pass finished"
        );
        Ok(report)
    }

    async fn reconcile_table(&self, table: Table, report: &mut ReconcileReport) -> Result<()> {
        let remote_records = self.remote.select(table, &self.scope).await?;
        let local_records = self
            .local
            .list(
                table,
                &RecordFilter::none(),
                &ListOptions {
                    order_by: OrderBy::UpdatedAt,
                    descending: false,
                    limit: None,
                    offset: None,
                },
            )
            .await?;

        let mut remote_by_id: HashMap<String, Record> = remote_records
            .into_iter()
            .map(|record| (record.id.as_str().to_string(), record))
            .collect();

        for local in local_records {
            match remote_by_id.remove(local.id.as_str()) {
                None => {
                    if self.push(table, &local).await? {
                        report.pushed += 1;
                    } else {
                        report.remote_errors += 1;
                    }
                }
                Some(remote) => {
                    if local.is_older_than(&remote) {
                        // Remote strictly newer: pull-driven overwrite,
                        // bypassing the outbox
                        self.local.upsert(&remote).await?;
                        report.refreshed_local += 1;
                    } else if remote.is_older_than(&local) {
                        if self.push(table, &local).await? {
                            report.refreshed_remote += 1;
                        } else {
                            report.remote_errors += 1;
                        }
                    }
                    // Equal timestamps: no-op, local retained
                }
            }
        }

        for (_, remote) in remote_by_id {
            self.local.upsert(&remote).await?;
            report.pulled += 1;
        }

        Ok(())
    }

    /// Remote push failures are absorbed per record so one rejected row
    /// cannot stall the rest of the table.
    async fn push(&self, table: Table, record: &Record) -> Result<bool> {
        match self.remote.upsert(table, std::slice::from_ref(record)).await {
            Ok(()) => Ok(true),
            Err(err) if err.is_remote() => {
                warn!(
                    target: "sync::reconciler",
                    table = %table,
                    record_id = %record.id,
                    error = %err,
                    "reconcile push failed"
                );
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
