//! `SQLite` database connection and operations.
//!
//! The database is stored at `~/.todosync/todosync.db` and holds the durable
//! sync queue table.

use std::time::Duration;

use rusqlite::Connection;

use crate::config::Paths;
use crate::error::TodoSyncError;

use super::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, TodoSyncError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, TodoSyncError> {
        let conn = Connection::open(path).map_err(|e| {
            TodoSyncError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        // Concurrent CLI invocations share the file
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| TodoSyncError::Database(format!("Failed to set busy timeout: {e}")))?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, TodoSyncError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            TodoSyncError::Database(format!("Failed to open in-memory database: {e}"))
        })?;

        let db = Self { conn };
        db.migrate()?;

        Ok(db)
    }

    /// Run database migrations.
    fn migrate(&self) -> Result<(), TodoSyncError> {
        migrations::run(&self.conn)
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, TodoSyncError> {
        migrations::get_version(&self.conn)
    }

    /// Get a reference to the underlying connection.
    ///
    /// Used by the sync queue store for its prepared statements.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
