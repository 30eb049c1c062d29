//! Database migrations for todosync.
//!
//! Each migration upgrades the schema by one version. Migrations run
//! automatically when the database is opened.

use rusqlite::Connection;

use crate::error::TodoSyncError;

/// Current schema version.
const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, TodoSyncError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| TodoSyncError::Database(format!("Failed to get schema version: {e}")))
}

fn set_version(conn: &Connection, version: i32) -> Result<(), TodoSyncError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| TodoSyncError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), TodoSyncError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

fn run_migration(conn: &Connection, version: i32) -> Result<(), TodoSyncError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(TodoSyncError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: durable sync queue.
///
/// `synced` is 0/1. Enqueue order is the implicit `rowid`. The
/// `(synced, timestamp)` index serves the oldest-pending lookup and the purge
/// of old synced rows.
fn migrate_v1(conn: &Connection) -> Result<(), TodoSyncError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS sync_queue (
            id TEXT PRIMARY KEY,
            action TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            schema_version INTEGER NOT NULL DEFAULT 1,
            timestamp TEXT NOT NULL,
            synced INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_sync_queue_synced_timestamp
        ON sync_queue(synced, timestamp);

        CREATE INDEX IF NOT EXISTS idx_sync_queue_entity
        ON sync_queue(entity_type, entity_id);
        ",
    )
    .map_err(|e| TodoSyncError::Database(format!("Migration v1 failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_v1() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        conn.execute(
            "INSERT INTO sync_queue (id, action, entity_type, entity_id, data, timestamp)
             VALUES ('op-1', 'update', 'project', 'p1', '{\"name\":\"Home\"}', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();

        let synced: i64 = conn
            .query_row("SELECT synced FROM sync_queue WHERE id = 'op-1'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(synced, 0);
    }

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_get_version_new_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        let insert = "INSERT INTO sync_queue (id, action, entity_type, entity_id, data, timestamp)
                      VALUES ('dup', 'delete', 'label', 'l1', 'null', '2024-01-01T10:00:00Z')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
