//! Durable queue storage.
//!
//! [`QueueStore`] is the persistence seam the engine depends on. [`SyncQueue`]
//! implements it on top of the SQLite `sync_queue` table.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::operation::{EntityType, OperationKind, Payload, QueueRow};
use crate::error::TodoSyncError;
use crate::storage::Database;

/// Keyed table of queue rows.
#[cfg_attr(test, mockall::automock)]
pub trait QueueStore: Send + Sync {
    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// Returns an error if the row cannot be persisted.
    fn insert(&self, row: &QueueRow) -> Result<(), TodoSyncError>;

    /// Flag a row as synced. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    fn mark_synced(&self, id: &str) -> Result<(), TodoSyncError>;

    /// All rows in enqueue order.
    ///
    /// Order follows insertion, not the row timestamp, so a wall clock that
    /// steps backwards cannot reorder replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan fails.
    fn scan_all(&self) -> Result<Vec<QueueRow>, TodoSyncError>;

    /// A single row by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get(&self, id: &str) -> Result<Option<QueueRow>, TodoSyncError>;

    /// Delete a row, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, id: &str) -> Result<bool, TodoSyncError>;

    /// Delete synced rows enqueued before `cutoff`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn purge_synced(&self, cutoff: DateTime<Utc>) -> Result<usize, TodoSyncError>;

    /// Row counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn stats(&self) -> Result<QueueStats, TodoSyncError>;
}

/// Queue statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct QueueStats {
    /// Rows not yet acknowledged by the remote system
    pub pending: i64,
    /// Rows flagged synced but not yet purged
    pub synced: i64,
    /// Oldest unsynced row
    pub oldest_pending: Option<DateTime<Utc>>,
}

/// SQLite-backed sync queue.
pub struct SyncQueue {
    db: Mutex<Database>,
}

impl SyncQueue {
    /// Open the queue in the default database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn new() -> Result<Self, TodoSyncError> {
        Ok(Self::with_database(Database::open()?))
    }

    /// Create a sync queue with an existing database connection.
    #[must_use]
    pub const fn with_database(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, action, entity_type, entity_id, data, schema_version, timestamp, synced FROM sync_queue";

impl QueueStore for SyncQueue {
    fn insert(&self, row: &QueueRow) -> Result<(), TodoSyncError> {
        let data = serde_json::to_string(&row.data.body)?;
        let db = self.db();

        db.connection()
            .execute(
                r"INSERT INTO sync_queue
                  (id, action, entity_type, entity_id, data, schema_version, timestamp, synced)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.id,
                    row.action.as_str(),
                    row.entity_type.as_str(),
                    row.entity_id,
                    data,
                    row.data.schema_version,
                    row.timestamp.to_rfc3339(),
                    row.synced,
                ],
            )
            .map_err(|e| TodoSyncError::Database(format!("Failed to enqueue operation: {e}")))?;

        Ok(())
    }

    fn mark_synced(&self, id: &str) -> Result<(), TodoSyncError> {
        self.db()
            .connection()
            .execute("UPDATE sync_queue SET synced = 1 WHERE id = ?1", [id])
            .map_err(|e| {
                TodoSyncError::Database(format!("Failed to mark operation synced: {e}"))
            })?;

        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<QueueRow>, TodoSyncError> {
        let db = self.db();
        let mut stmt = db
            .connection()
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY rowid ASC"))
            .map_err(|e| TodoSyncError::Database(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], row_to_queue_row)
            .map_err(|e| TodoSyncError::Database(format!("Failed to scan queue: {e}")))?;

        let mut queue_rows = Vec::new();
        for row in rows {
            queue_rows.push(row.map_err(|e| TodoSyncError::Database(e.to_string()))?);
        }

        Ok(queue_rows)
    }

    fn get(&self, id: &str) -> Result<Option<QueueRow>, TodoSyncError> {
        let db = self.db();
        let mut stmt = db
            .connection()
            .prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))
            .map_err(|e| TodoSyncError::Database(format!("Failed to prepare query: {e}")))?;

        stmt.query_row([id], row_to_queue_row)
            .optional()
            .map_err(|e| TodoSyncError::Database(format!("Failed to query operation: {e}")))
    }

    fn delete(&self, id: &str) -> Result<bool, TodoSyncError> {
        let rows = self
            .db()
            .connection()
            .execute("DELETE FROM sync_queue WHERE id = ?1", [id])
            .map_err(|e| TodoSyncError::Database(format!("Failed to delete operation: {e}")))?;

        Ok(rows > 0)
    }

    fn purge_synced(&self, cutoff: DateTime<Utc>) -> Result<usize, TodoSyncError> {
        self.db()
            .connection()
            .execute(
                "DELETE FROM sync_queue WHERE synced = 1 AND timestamp < ?1",
                [cutoff.to_rfc3339()],
            )
            .map_err(|e| TodoSyncError::Database(format!("Failed to purge operations: {e}")))
    }

    fn stats(&self) -> Result<QueueStats, TodoSyncError> {
        let db = self.db();
        let conn = db.connection();

        let (pending, synced): (i64, i64) = conn
            .query_row(
                "SELECT COALESCE(SUM(synced = 0), 0), COALESCE(SUM(synced = 1), 0) FROM sync_queue",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(|e| TodoSyncError::Database(format!("Failed to count queue: {e}")))?;

        let oldest_pending: Option<String> = conn
            .query_row(
                "SELECT timestamp FROM sync_queue WHERE synced = 0 ORDER BY timestamp ASC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| TodoSyncError::Database(format!("Failed to get oldest pending: {e}")))?;

        Ok(QueueStats {
            pending,
            synced,
            oldest_pending: oldest_pending.and_then(|s| parse_timestamp(&s)),
        })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn conversion_error(column: usize, err: TodoSyncError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn row_to_queue_row(row: &Row<'_>) -> Result<QueueRow, rusqlite::Error> {
    let action: String = row.get(1)?;
    let entity_type: String = row.get(2)?;
    let data: String = row.get(4)?;
    let schema_version: u32 = row.get(5)?;
    let timestamp: String = row.get(6)?;

    let body = serde_json::from_str(&data).map_err(|e| conversion_error(4, e.into()))?;
    let timestamp = parse_timestamp(&timestamp).ok_or_else(|| {
        conversion_error(6, TodoSyncError::Parse(format!("Bad timestamp: {timestamp}")))
    })?;

    Ok(QueueRow {
        id: row.get(0)?,
        action: OperationKind::parse(&action).map_err(|e| conversion_error(1, e))?,
        entity_type: EntityType::parse(&entity_type).map_err(|e| conversion_error(2, e))?,
        entity_id: row.get(3)?,
        data: Payload {
            schema_version,
            body,
        },
        timestamp,
        synced: row.get(7)?,
    })
}
