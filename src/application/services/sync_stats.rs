use crate::application::ports::local_store::LocalStore;
use crate::application::ports::outbox::SyncOutbox;
use crate::application::ports::remote_store::{RemoteFilter, RemoteStore};
use crate::application::services::connectivity::ConnectivityMonitor;
use crate::domain::value_objects::Table;
use crate::shared::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalStats {
    /// Record count per table, keyed by table name.
    pub tables: BTreeMap<String, i64>,
    pub pending_sync: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudStats {
    pub tables: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStatus {
    pub pending: i64,
    pub completed: i64,
    pub failed: i64,
    pub online: bool,
    pub last_probe_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStats {
    pub local: LocalStats,
    /// None while offline or when the remote refuses the count queries.
    pub cloud: Option<CloudStats>,
    pub sync: SyncStatus,
}

/// Read-only snapshot assembly for dashboards and diagnostics. Local and
/// queue numbers always come back; cloud numbers are best-effort and
/// omitted rather than failing the whole snapshot.
pub struct StatsCollector {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    outbox: Arc<dyn SyncOutbox>,
    connectivity: Arc<ConnectivityMonitor>,
    scope: RemoteFilter,
}

impl StatsCollector {
    pub fn new(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        outbox: Arc<dyn SyncOutbox>,
        connectivity: Arc<ConnectivityMonitor>,
        scope: RemoteFilter,
    ) -> Self {
        Self {
            local,
            remote,
            outbox,
            connectivity,
            scope,
        }
    }

    pub async fn collect(&self) -> Result<SyncStats> {
        let counts = self.outbox.counts().await?;

        let mut local = LocalStats {
            tables: BTreeMap::new(),
            pending_sync: counts.pending,
        };
        for table in Table::ALL {
            local
                .tables
                .insert(table.as_str().to_string(), self.local.count(table).await?);
        }

        let online = self.connectivity.is_online();
        let cloud = if online {
            self.collect_cloud().await
        } else {
            None
        };

        Ok(SyncStats {
            local,
            cloud,
            sync: SyncStatus {
                pending: counts.pending,
                completed: counts.completed,
                failed: counts.failed,
                online,
                last_probe_at: self.connectivity.last_probe_at(),
            },
        })
    }

    async fn collect_cloud(&self) -> Option<CloudStats> {
        let mut tables = BTreeMap::new();
        for table in Table::ALL {
            match self.remote.count(table, &self.scope).await {
                Ok(count) => {
                    tables.insert(table.as_str().to_string(), count);
                }
                Err(err) => {
                    warn!(
                        target: "sync::stats",
                        table = %table,
                        error = %err,
                        "cloud count unavailable"
                    );
                    return None;
                }
            }
        }
        Some(CloudStats { tables })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::clock::{Clock, ManualClock};
    use crate::application::services::storage_service::StorageService;
    use crate::domain::entities::RecordDraft;
    use crate::domain::value_objects::{Operation, RecordPayload};
    use crate::infrastructure::database::{SqliteLocalStore, SqliteOutbox};
    use crate::infrastructure::remote::InMemoryRemoteStore;
    use chrono::Utc;
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup() -> (StorageService, StatsCollector, Arc<InMemoryRemoteStore>, Arc<ConnectivityMonitor>) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        let local = Arc::new(SqliteLocalStore::new(pool.clone()));
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let outbox = Arc::new(SqliteOutbox::new(pool, 3, clock.clone()));
        let remote = Arc::new(InMemoryRemoteStore::new());
        let monitor = Arc::new(ConnectivityMonitor::new(remote.clone(), clock.clone()));

        let storage = StorageService::new(local.clone(), outbox.clone(), clock);
        let collector = StatsCollector::new(
            local,
            remote.clone(),
            outbox,
            monitor.clone(),
            RemoteFilter::default(),
        );
        (storage, collector, remote, monitor)
    }

    fn profile_draft(name: &str) -> RecordDraft {
        RecordDraft::new(None, RecordPayload::new(json!({ "name": name })).unwrap())
    }

    #[tokio::test]
    async fn test_offline_snapshot_has_local_numbers_and_no_cloud() {
        let (storage, collector, _, _) = setup().await;
        storage
            .save_record(Table::Profiles, profile_draft("a"), Operation::Insert)
            .await
            .unwrap();
        storage
            .save_record(Table::Profiles, profile_draft("b"), Operation::Insert)
            .await
            .unwrap();

        let stats = collector.collect().await.unwrap();
        assert!(!stats.sync.online);
        assert!(stats.cloud.is_none());
        assert_eq!(stats.local.tables["profiles"], 2);
        assert_eq!(stats.local.tables["campaigns"], 0);
        assert_eq!(stats.local.pending_sync, 2);
        assert_eq!(stats.sync.pending, 2);
    }

    #[tokio::test]
    async fn test_online_snapshot_includes_cloud_counts() {
        let (storage, collector, remote, monitor) = setup().await;
        let record = storage
            .save_record(Table::Profiles, profile_draft("a"), Operation::Insert)
            .await
            .unwrap();
        remote.insert_directly(record).await;
        monitor.probe_once().await;

        let stats = collector.collect().await.unwrap();
        assert!(stats.sync.online);
        assert!(stats.sync.last_probe_at.is_some());
        let cloud = stats.cloud.unwrap();
        assert_eq!(cloud.tables["profiles"], 1);
        assert_eq!(cloud.tables["settings"], 0);
    }

    #[tokio::test]
    async fn test_cloud_counts_degrade_to_none_on_remote_error() {
        let (_, collector, remote, monitor) = setup().await;
        monitor.probe_once().await;
        remote.set_unavailable(true);

        let stats = collector.collect().await.unwrap();
        assert!(stats.sync.online);
        assert!(stats.cloud.is_none());
    }
}
