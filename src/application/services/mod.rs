pub mod connectivity;
pub mod reconciler;
pub mod storage_service;
pub mod sync_scheduler;
pub mod sync_stats;

pub use connectivity::ConnectivityMonitor;
pub use reconciler::{ReconcileReport, Reconciler};
pub use storage_service::StorageService;
pub use sync_scheduler::{DrainReport, SyncScheduler};
pub use sync_stats::{CloudStats, LocalStats, StatsCollector, SyncStats, SyncStatus};
