use serde::{Deserialize, Serialize};

/// Outbox entry state. `Completed` and `Failed` are terminal; failed
/// entries require external resolution and are never re-dequeued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Completed,
    Failed,
    Unknown(String),
}

impl QueueStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Completed => "completed",
            QueueStatus::Failed => "failed",
            QueueStatus::Unknown(value) => value.as_str(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Failed)
    }
}

impl From<&str> for QueueStatus {
    fn from(value: &str) -> Self {
        match value {
            "pending" => QueueStatus::Pending,
            "completed" => QueueStatus::Completed,
            "failed" => QueueStatus::Failed,
            other => QueueStatus::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_states() {
        assert_eq!(QueueStatus::from("pending"), QueueStatus::Pending);
        assert_eq!(QueueStatus::from("completed"), QueueStatus::Completed);
        assert_eq!(QueueStatus::from("failed"), QueueStatus::Failed);
        assert_eq!(
            QueueStatus::from("stuck"),
            QueueStatus::Unknown("stuck".to_string())
        );
    }

    #[test]
    fn terminal_states() {
        assert!(!QueueStatus::Pending.is_terminal());
        assert!(QueueStatus::Completed.is_terminal());
        assert!(QueueStatus::Failed.is_terminal());
    }
}
