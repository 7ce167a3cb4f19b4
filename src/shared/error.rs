use thiserror::Error;

/// Errors raised by the persistence and synchronization engine.
///
/// Local-path variants (`LocalWrite`, `Validation`, `NotFound`) are fatal to
/// the triggering domain call and propagate synchronously. Remote-path
/// variants (`RemoteUnavailable`, `RemoteRejected`) are confined to the
/// background tasks and only surface through the sync stats.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Local write failed: {0}")]
    LocalWrite(String),

    #[error("Outbox enqueue failed: {0}")]
    QueueEnqueue(String),

    #[error("Remote store unreachable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote store rejected operation: {0}")]
    RemoteRejected(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// True for errors that are expected while offline and must never
    /// propagate to domain callers.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::RemoteUnavailable(_) | SyncError::RemoteRejected(_)
        )
    }
}

impl From<sqlx::Error> for SyncError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SyncError::NotFound(err.to_string()),
            other => SyncError::LocalWrite(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            SyncError::RemoteUnavailable(err.to_string())
        } else {
            SyncError::RemoteRejected(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
