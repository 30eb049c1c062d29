//! JSON output formatting for todosync.

use serde::Serialize;
use serde_json::json;

use crate::error::TodoSyncError;
use crate::sync::{PendingOperation, QueueStats, SyncResult, SyncStatus};

/// Format queue statistics and engine state as JSON
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_status_json(stats: &QueueStats, status: &SyncStatus) -> Result<String, TodoSyncError> {
    let output = json!({
        "online": status.is_online,
        "syncing": status.is_syncing,
        "pending": stats.pending,
        "synced": stats.synced,
        "oldest_pending": stats.oldest_pending.map(|t| t.to_rfc3339()),
        "last_sync_at": status.last_sync_at.map(|t| t.to_rfc3339()),
        "error": status.error,
    });
    to_json(&output)
}

/// Format pending operations as JSON
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_operations_json(
    operations: &[PendingOperation],
    limit: usize,
) -> Result<String, TodoSyncError> {
    let items: Vec<_> = operations.iter().take(limit).collect();
    let output = json!({
        "count": operations.len(),
        "items": items,
    });
    to_json(&output)
}

/// Format a drain result as JSON
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_sync_result_json(result: &SyncResult) -> Result<String, TodoSyncError> {
    let output = json!({
        "succeeded": result.succeeded,
        "failed": result.failed,
        "skipped": result.skipped,
        "aborted": result.aborted,
        "total": result.total(),
        "results": result.results,
    });
    to_json(&output)
}

/// Generic JSON serializer for any serializable type
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, TodoSyncError> {
    Ok(serde_json::to_string_pretty(value)?)
}
