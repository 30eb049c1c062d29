//! Error types for todosync.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, TodoSyncError>;

/// Errors surfaced by the sync engine, storage and CLI layers.
#[derive(Debug, Error)]
pub enum TodoSyncError {
    /// Durable queue store failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload or JSON input could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Referenced operation does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller supplied a value outside the accepted set.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for TodoSyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<rusqlite::Error> for TodoSyncError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl TodoSyncError {
    /// Whether this error came from the persistence layer.
    #[must_use]
    pub const fn is_persistence(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Io(_))
    }
}
