//! Local-first persistence with background cloud synchronization.
//!
//! Every write lands in SQLite first and appends one entry to a durable
//! outbox. A connectivity monitor gates two background loops: a scheduler
//! that drains the outbox toward the remote store in per-table FIFO
//! batches, and a reconciler that merges both sides with last-write-wins
//! on `updated_at`. [`SyncEngine`] is the single entry point.

pub mod application;
pub mod domain;
pub mod engine;
pub mod infrastructure;
pub mod shared;

pub use application::ports::clock::{Clock, ManualClock, SystemClock};
pub use application::ports::local_store::{ListOptions, LocalStore, OrderBy, RecordFilter};
pub use application::ports::outbox::{QueueCounts, SyncOutbox};
pub use application::ports::remote_store::{RemoteFilter, RemoteStore};
pub use application::services::{
    ConnectivityMonitor, DrainReport, ReconcileReport, Reconciler, StatsCollector, StorageService,
    SyncScheduler, SyncStats, SyncStatus,
};
pub use domain::entities::{QueueEntry, QueueEntryDraft, Record, RecordDraft};
pub use domain::value_objects::{
    Operation, QueueStatus, RecordId, RecordPayload, Table, TableSchema,
};
pub use engine::SyncEngine;
pub use infrastructure::database::{Database, SqliteLocalStore, SqliteOutbox};
pub use infrastructure::remote::{HttpRemoteStore, InMemoryRemoteStore};
pub use shared::config::{AppConfig, DatabaseConfig, RemoteConfig, SyncConfig};
pub use shared::error::{Result, SyncError};
pub use shared::logging::init_logging;
