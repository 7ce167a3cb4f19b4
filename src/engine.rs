use crate::application::ports::clock::{Clock, SystemClock};
use crate::application::ports::local_store::{ListOptions, RecordFilter};
use crate::application::ports::outbox::{QueueCounts, SyncOutbox};
use crate::application::ports::remote_store::{RemoteFilter, RemoteStore};
use crate::application::services::{
    ConnectivityMonitor, DrainReport, ReconcileReport, Reconciler, StatsCollector, StorageService,
    SyncScheduler, SyncStats,
};
use crate::domain::entities::{Record, RecordDraft};
use crate::domain::value_objects::{Operation, RecordId, Table};
use crate::infrastructure::database::{Database, DbPool, SqliteLocalStore, SqliteOutbox};
use crate::infrastructure::remote::HttpRemoteStore;
use crate::shared::config::AppConfig;
use crate::shared::error::{Result, SyncError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Top-level facade wiring the local store, outbox, connectivity monitor,
/// scheduler and reconciler behind one handle. All writes go through here
/// so the outbox invariant holds crate-wide.
pub struct SyncEngine {
    config: AppConfig,
    pool: DbPool,
    storage: StorageService,
    outbox: Arc<dyn SyncOutbox>,
    connectivity: Arc<ConnectivityMonitor>,
    scheduler: Arc<SyncScheduler>,
    reconciler: Arc<Reconciler>,
    stats: StatsCollector,
    shutdown_tx: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncEngine {
    /// Opens (and migrates) the local database, then wires every service
    /// against the provided remote adapter. Background loops do not start
    /// until [`SyncEngine::start`] is called.
    pub async fn new(config: AppConfig, remote: Arc<dyn RemoteStore>) -> Result<Self> {
        config.validate().map_err(SyncError::Validation)?;

        let pool = Database::initialize(
            &config.database.url,
            config.database.max_connections,
            config.database.connection_timeout,
        )
        .await
        .map_err(|err| SyncError::Internal(err.to_string()))?;

        let local = Arc::new(SqliteLocalStore::new(pool.clone()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let max_retries = i32::try_from(config.sync.max_retry).unwrap_or(i32::MAX);
        let outbox: Arc<dyn SyncOutbox> =
            Arc::new(SqliteOutbox::new(pool.clone(), max_retries, clock.clone()));
        let connectivity = Arc::new(ConnectivityMonitor::new(remote.clone(), clock.clone()));

        let scope = match &config.remote.owner_id {
            Some(owner) => RemoteFilter::owned_by(owner.clone()),
            None => RemoteFilter::default(),
        };

        let storage = StorageService::new(local.clone(), outbox.clone(), clock);
        let scheduler = Arc::new(SyncScheduler::new(
            outbox.clone(),
            local.clone(),
            remote.clone(),
            connectivity.clone(),
            config.sync.batch_size,
        ));
        let reconciler = Arc::new(Reconciler::new(
            local.clone(),
            remote.clone(),
            connectivity.clone(),
            scope.clone(),
        ));
        let stats = StatsCollector::new(
            local,
            remote,
            outbox.clone(),
            connectivity.clone(),
            scope,
        );

        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            pool,
            storage,
            outbox,
            connectivity,
            scheduler,
            reconciler,
            stats,
            shutdown_tx,
            workers: Mutex::new(Vec::new()),
        })
    }

    /// Convenience constructor for the HTTP remote described by the config.
    pub async fn with_http_remote(config: AppConfig) -> Result<Self> {
        let remote = Arc::new(HttpRemoteStore::new(&config.remote)?);
        Self::new(config, remote).await
    }

    /// Spawns the probe, drain and reconcile loops. Idempotent in effect:
    /// callers are expected to pair this with one `shutdown`. When
    /// `auto_sync` is off only the connectivity probe runs and draining is
    /// left to manual triggers.
    pub async fn start(&self) {
        let mut workers = self.workers.lock().await;
        if !workers.is_empty() {
            warn!(target: "sync::engine", "background loops already running");
            return;
        }

        // First probe runs inline so an already-reachable remote is seen
        // before the first drain tick.
        self.connectivity.probe_once().await;

        workers.push(self.spawn_probe_loop());
        if self.config.sync.auto_sync {
            workers.push(self.spawn_drain_loop());
            workers.push(self.spawn_reconcile_loop());
        }
        info!(
            target: "sync::engine",
            auto_sync = self.config.sync.auto_sync,
            probe_interval = self.config.sync.probe_interval,
            sync_interval = self.config.sync.sync_interval,
            reconcile_interval = self.config.sync.reconcile_interval,
            "sync engine started"
        );
    }

    /// Stops the background loops and waits for them to exit. The database
    /// pool stays open; call `close` to release it.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let mut workers = self.workers.lock().await;
        for handle in workers.drain(..) {
            if let Err(err) = handle.await {
                error!(target: "sync::engine", error = %err, "worker task panicked");
            }
        }
        let _ = self.shutdown_tx.send(false);
        info!(target: "sync::engine", "sync engine stopped");
    }

    pub async fn close(&self) {
        self.shutdown().await;
        self.pool.close().await;
    }

    fn spawn_probe_loop(&self) -> JoinHandle<()> {
        let connectivity = self.connectivity.clone();
        let period = Duration::from_secs(self.config.sync.probe_interval);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        connectivity.probe_once().await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    fn spawn_drain_loop(&self) -> JoinHandle<()> {
        let scheduler = self.scheduler.clone();
        let period = Duration::from_secs(self.config.sync.sync_interval);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = scheduler.run_once().await {
                            error!(target: "sync::engine", error = %err, "outbox drain aborted");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    fn spawn_reconcile_loop(&self) -> JoinHandle<()> {
        let reconciler = self.reconciler.clone();
        let period = Duration::from_secs(self.config.sync.reconcile_interval);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(err) = reconciler.run_once().await {
                            error!(target: "sync::engine", error = %err, "reconcile pass aborted");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }

    // Storage API

    pub async fn save_record(
        &self,
        table: Table,
        draft: RecordDraft,
        operation: Operation,
    ) -> Result<Record> {
        self.storage.save_record(table, draft, operation).await
    }

    pub async fn get_record_by_id(&self, table: Table, id: &RecordId) -> Result<Option<Record>> {
        self.storage.get_record_by_id(table, id).await
    }

    pub async fn get_records(
        &self,
        table: Table,
        filter: &RecordFilter,
        options: &ListOptions,
    ) -> Result<Vec<Record>> {
        self.storage.get_records(table, filter, options).await
    }

    pub async fn delete_record(&self, table: Table, id: &RecordId) -> Result<bool> {
        self.storage.delete_record(table, id).await
    }

    // Sync controls

    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    pub async fn probe_connectivity(&self) -> bool {
        self.connectivity.probe_once().await
    }

    /// One outbox drain pass, regardless of the auto-sync setting.
    pub async fn run_sync_once(&self) -> Result<DrainReport> {
        self.scheduler.run_once().await
    }

    /// One bidirectional reconcile pass.
    pub async fn run_reconcile_once(&self) -> Result<ReconcileReport> {
        self.reconciler.run_once().await
    }

    pub async fn queue_counts(&self) -> Result<QueueCounts> {
        self.outbox.counts().await
    }

    pub async fn get_sync_stats(&self) -> Result<SyncStats> {
        self.stats.collect().await
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
