//! Path resolution for todosync configuration and data files.
//!
//! All todosync data is stored in `~/.todosync/` (or `$TODOSYNC_HOME`):
//! - `config.yaml` - Main configuration file
//! - `todosync.db` - SQLite database holding the durable sync queue

use std::path::PathBuf;

use crate::error::TodoSyncError;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "TODOSYNC_HOME";

/// Paths to todosync configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.todosync/`
    pub root: PathBuf,
    /// Config file: `~/.todosync/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.todosync/todosync.db`
    pub database: PathBuf,
}

impl Paths {
    /// Resolve paths from `$TODOSYNC_HOME`, falling back to the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if neither variable is set.
    pub fn new() -> Result<Self, TodoSyncError> {
        if let Ok(root) = std::env::var(HOME_ENV) {
            if !root.is_empty() {
                return Ok(Self::with_root(PathBuf::from(root)));
            }
        }

        let home = std::env::var("HOME").map_err(|_| {
            TodoSyncError::Config("Could not determine home directory".to_string())
        })?;

        Ok(Self::with_root(PathBuf::from(home).join(".todosync")))
    }

    /// Create paths with a custom root directory (useful for testing).
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("todosync.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), TodoSyncError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                TodoSyncError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}
