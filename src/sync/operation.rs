//! Operation types for the sync queue.
//!
//! A [`PendingOperation`] is one mutation awaiting delivery to the remote
//! system. Its durable form is a [`QueueRow`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TodoSyncError;

/// Schema version stamped on newly created payloads.
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

/// Kind of mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
    Update,
    Delete,
}

impl OperationKind {
    /// Stable storage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Parse a storage name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for anything outside `create|update|delete`.
    pub fn parse(s: &str) -> Result<Self, TodoSyncError> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            other => Err(TodoSyncError::InvalidInput(format!(
                "Unknown operation type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Task,
    Project,
    Section,
    Label,
}

impl EntityType {
    /// Stable storage name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Section => "section",
            Self::Label => "label",
        }
    }

    /// Parse a storage name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for anything outside the closed set.
    pub fn parse(s: &str) -> Result<Self, TodoSyncError> {
        match s.to_lowercase().as_str() {
            "task" => Ok(Self::Task),
            "project" => Ok(Self::Project),
            "section" => Ok(Self::Section),
            "label" => Ok(Self::Label),
            other => Err(TodoSyncError::InvalidInput(format!(
                "Unknown entity type: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Change set or full entity carried by an operation.
///
/// The body stays opaque JSON; `schema_version` lets readers pick the right
/// typed shape before calling [`Payload::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub schema_version: u32,
    pub body: serde_json::Value,
}

impl Payload {
    /// Wrap a JSON body at the current schema version.
    #[must_use]
    pub const fn new(body: serde_json::Value) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            body,
        }
    }

    /// Serialize a typed value into a payload.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the value cannot be represented as JSON.
    pub fn from_typed<T: Serialize>(value: &T) -> Result<Self, TodoSyncError> {
        Ok(Self::new(serde_json::to_value(value)?))
    }

    /// Deserialize the body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, TodoSyncError> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            TodoSyncError::Parse(format!(
                "Invalid payload (schema v{}): {e}",
                self.schema_version
            ))
        })
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new(serde_json::Value::Null)
    }
}

/// A queued, not-yet-acknowledged mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingOperation {
    /// Unique ID, also the idempotency key for the remote transport
    pub id: String,
    #[serde(rename = "type")]
    pub kind: OperationKind,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub data: Payload,
    pub created_at: DateTime<Utc>,
    /// Failed attempts in this process; reset on cold start
    pub retries: u32,
    pub last_error: Option<String>,
}

impl PendingOperation {
    /// Create a fresh operation with a generated id.
    #[must_use]
    pub fn new(
        kind: OperationKind,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        data: Payload,
    ) -> Self {
        Self {
            id: format!("op-{}", Uuid::new_v4()),
            kind,
            entity_type,
            entity_id: entity_id.into(),
            data,
            created_at: Utc::now(),
            retries: 0,
            last_error: None,
        }
    }

    /// Human label used in the sync log, e.g. `create task`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.kind, self.entity_type)
    }

    /// Whether automatic retries have been exhausted.
    #[must_use]
    pub const fn is_exhausted(&self, max_retries: u32) -> bool {
        self.retries >= max_retries
    }

    /// Durable row for this operation, unsynced.
    #[must_use]
    pub fn to_row(&self) -> QueueRow {
        QueueRow {
            id: self.id.clone(),
            action: self.kind,
            entity_type: self.entity_type,
            entity_id: self.entity_id.clone(),
            data: self.data.clone(),
            timestamp: self.created_at,
            synced: false,
        }
    }
}

impl From<QueueRow> for PendingOperation {
    /// Rebuild from storage; retry counters are not persisted.
    fn from(row: QueueRow) -> Self {
        Self {
            id: row.id,
            kind: row.action,
            entity_type: row.entity_type,
            entity_id: row.entity_id,
            data: row.data,
            created_at: row.timestamp,
            retries: 0,
            last_error: None,
        }
    }
}

/// Row shape of the durable queue table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueRow {
    pub id: String,
    pub action: OperationKind,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub data: Payload,
    pub timestamp: DateTime<Utc>,
    pub synced: bool,
}
