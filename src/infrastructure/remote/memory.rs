use crate::application::ports::remote_store::{RemoteFilter, RemoteStore};
use crate::domain::entities::Record;
use crate::domain::value_objects::{RecordId, Table};
use crate::shared::error::{Result, SyncError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::RwLock;

/// In-memory remote store used in standalone mode and by the test suite.
/// Fault injection: `set_unavailable` simulates an offline period,
/// `fail_next` rejects the next N mutating calls.
#[derive(Default)]
pub struct InMemoryRemoteStore {
    tables: RwLock<HashMap<Table, HashMap<String, Record>>>,
    unavailable: AtomicBool,
    fail_next: AtomicU32,
}

impl InMemoryRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fail_next(&self, failures: u32) {
        self.fail_next.store(failures, Ordering::SeqCst);
    }

    pub async fn get(&self, table: Table, id: &RecordId) -> Option<Record> {
        self.tables
            .read()
            .await
            .get(&table)
            .and_then(|records| records.get(id.as_str()).cloned())
    }

    /// Seeds remote state directly, outside the adapter contract.
    pub async fn insert_directly(&self, record: Record) {
        self.tables
            .write()
            .await
            .entry(record.table)
            .or_default()
            .insert(record.id.as_str().to_string(), record);
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SyncError::RemoteUnavailable(
                "remote store is unreachable".to_string(),
            ));
        }
        Ok(())
    }

    fn check_fault(&self) -> Result<()> {
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(SyncError::RemoteRejected("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn upsert(&self, table: Table, records: &[Record]) -> Result<()> {
        self.check_reachable()?;
        self.check_fault()?;

        let mut tables = self.tables.write().await;
        let entries = tables.entry(table).or_default();
        for record in records {
            entries.insert(record.id.as_str().to_string(), record.clone());
        }
        Ok(())
    }

    async fn delete(&self, table: Table, id: &RecordId) -> Result<()> {
        self.check_reachable()?;
        self.check_fault()?;

        if let Some(entries) = self.tables.write().await.get_mut(&table) {
            entries.remove(id.as_str());
        }
        Ok(())
    }

    async fn select(&self, table: Table, _filter: &RemoteFilter) -> Result<Vec<Record>> {
        self.check_reachable()?;
        Ok(self
            .tables
            .read()
            .await
            .get(&table)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn count(&self, table: Table, _filter: &RemoteFilter) -> Result<i64> {
        self.check_reachable()?;
        Ok(self
            .tables
            .read()
            .await
            .get(&table)
            .map(|records| records.len() as i64)
            .unwrap_or(0))
    }

    async fn ping(&self) -> Result<()> {
        self.check_reachable()
    }
}
