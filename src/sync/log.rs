//! Append-only sync log.
//!
//! Observational only; entries are never replayed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome recorded for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncLogStatus {
    /// Delivered and acknowledged
    Success,
    /// Retry ceiling reached; waiting for manual intervention
    Failed,
    /// Failed but will be retried automatically
    Pending,
}

impl std::fmt::Display for SyncLogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Pending => "pending",
        };
        write!(f, "{s}")
    }
}

/// One log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLogEntry {
    pub id: String,
    /// `"<type> <entityType>"`
    pub operation: String,
    pub status: SyncLogStatus,
    pub timestamp: DateTime<Utc>,
    pub error: Option<String>,
}

impl SyncLogEntry {
    #[must_use]
    pub fn new(operation: impl Into<String>, status: SyncLogStatus, error: Option<String>) -> Self {
        Self {
            id: format!("log-{}", Uuid::new_v4()),
            operation: operation.into(),
            status,
            timestamp: Utc::now(),
            error,
        }
    }
}

/// In-memory, age-bounded sync log.
#[derive(Debug, Clone, Default)]
pub struct SyncLog {
    entries: Vec<SyncLogEntry>,
}

impl SyncLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: SyncLogEntry) {
        self.entries.push(entry);
    }

    #[must_use]
    pub fn entries(&self) -> &[SyncLogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop entries at or before `cutoff`. Returns how many were removed.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.timestamp > cutoff);
        before - self.entries.len()
    }

    /// Drop entries older than `days` days.
    pub fn prune_older_than(&mut self, days: u32) -> usize {
        self.prune_before(Utc::now() - Duration::days(i64::from(days)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_aged(days: i64, status: SyncLogStatus) -> SyncLogEntry {
        let mut entry = SyncLogEntry::new("update task", status, None);
        entry.timestamp = Utc::now() - Duration::days(days);
        entry
    }

    #[test]
    fn test_push_and_read() {
        let mut log = SyncLog::new();
        assert!(log.is_empty());

        log.push(SyncLogEntry::new(
            "create task",
            SyncLogStatus::Pending,
            Some("offline".to_string()),
        ));

        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].operation, "create task");
        assert_eq!(log.entries()[0].error.as_deref(), Some("offline"));
    }

    #[test]
    fn test_prune_older_than() {
        let mut log = SyncLog::new();
        log.push(entry_aged(45, SyncLogStatus::Success));
        log.push(entry_aged(31, SyncLogStatus::Failed));
        log.push(entry_aged(2, SyncLogStatus::Success));
        log.push(entry_aged(0, SyncLogStatus::Pending));

        let removed = log.prune_older_than(30);

        assert_eq!(removed, 2);
        assert_eq!(log.len(), 2);
        assert!(log
            .entries()
            .iter()
            .all(|e| e.timestamp > Utc::now() - Duration::days(30)));
    }

    #[test]
    fn test_status_display() {
        assert_eq!(SyncLogStatus::Failed.to_string(), "failed");
        assert_eq!(SyncLogStatus::Pending.to_string(), "pending");
    }

    #[test]
    fn test_entry_ids_unique() {
        let a = SyncLogEntry::new("delete label", SyncLogStatus::Success, None);
        let b = SyncLogEntry::new("delete label", SyncLogStatus::Success, None);
        assert_ne!(a.id, b.id);
    }
}
