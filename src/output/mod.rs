//! Output formatting for todosync.
//!
//! Every command renders either colored text or pretty-printed JSON.

mod json;
mod pretty;

use crate::cli::args::OutputFormat;
use crate::conflict::{Reconciliation, ResolvedConflict};
use crate::error::TodoSyncError;
use crate::sync::{PendingOperation, QueueStats, SyncResult, SyncStatus};

pub use json::*;
pub use pretty::*;

/// Format queue statistics and engine state based on output format
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_status(
    stats: &QueueStats,
    status: &SyncStatus,
    format: OutputFormat,
) -> Result<String, TodoSyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_status_pretty(stats, status)),
        OutputFormat::Json => format_status_json(stats, status),
    }
}

/// Format pending operations based on output format
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_operations(
    operations: &[PendingOperation],
    limit: usize,
    format: OutputFormat,
) -> Result<String, TodoSyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_operations_pretty(operations, limit)),
        OutputFormat::Json => format_operations_json(operations, limit),
    }
}

/// Format a drain result based on output format
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_sync_result(result: &SyncResult, format: OutputFormat) -> Result<String, TodoSyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_sync_result_pretty(result)),
        OutputFormat::Json => format_sync_result_json(result),
    }
}

/// Format a conflict check based on output format
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_detection(conflict: bool, format: OutputFormat) -> Result<String, TodoSyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_detection_pretty(conflict)),
        OutputFormat::Json => to_json(&serde_json::json!({ "conflict": conflict })),
    }
}

/// Format a resolved conflict based on output format
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_resolution(
    resolved: &ResolvedConflict,
    format: OutputFormat,
) -> Result<String, TodoSyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_resolution_pretty(resolved)),
        OutputFormat::Json => to_json(resolved),
    }
}

/// Format a reconcile outcome based on output format
///
/// # Errors
///
/// Returns `TodoSyncError::Parse` if JSON serialization fails.
pub fn format_reconciliation(
    reconciliation: &Reconciliation,
    format: OutputFormat,
) -> Result<String, TodoSyncError> {
    match format {
        OutputFormat::Pretty => Ok(format_reconciliation_pretty(reconciliation)),
        OutputFormat::Json => to_json(reconciliation),
    }
}
