use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sync::EntityType;

/// How to pick a winner when local and remote diverged.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictStrategy {
    /// Newer side wins; local when the remote timestamp is unknown
    #[default]
    LastWriteWins,
    /// Local always wins
    ClientWins,
    /// Remote always wins
    ServerWins,
    /// Keep local provisionally and flag for review
    Manual,
}

impl ConflictStrategy {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LastWriteWins => "last-write-wins",
            Self::ClientWins => "client-wins",
            Self::ServerWins => "server-wins",
            Self::Manual => "manual",
        }
    }

    /// Parse a strategy name, falling back to last-write-wins for anything unknown.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "client-wins" => Self::ClientWins,
            "server-wins" => Self::ServerWins,
            "manual" => Self::Manual,
            _ => Self::LastWriteWins,
        }
    }
}

impl std::fmt::Display for ConflictStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shape of a single field, for field-aware merging.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Array,
    Object,
}

/// A detected divergence between the local and remote copy of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictInfo {
    pub operation_id: String,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub local_version: Value,
    pub remote_version: Value,
    /// When the local change was made
    pub timestamp: DateTime<Utc>,
    /// Remote last-modified time, when the backend reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_timestamp: Option<DateTime<Utc>>,
}

impl ConflictInfo {
    #[must_use]
    pub fn new(
        operation_id: impl Into<String>,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        local_version: Value,
        remote_version: Value,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            operation_id: operation_id.into(),
            entity_type,
            entity_id: entity_id.into(),
            local_version,
            remote_version,
            timestamp,
            remote_timestamp: None,
        }
    }

    #[must_use]
    pub const fn with_remote_timestamp(mut self, remote_timestamp: DateTime<Utc>) -> Self {
        self.remote_timestamp = Some(remote_timestamp);
        self
    }
}

/// Outcome of resolving a conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConflict {
    pub operation_id: String,
    pub strategy: ConflictStrategy,
    pub resolved_value: Value,
    /// The value is provisional; the caller must not apply it automatically
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub manual_review: bool,
}

/// Result of a three-way reconcile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Reconciliation {
    /// At most one side changed, or both converged
    NoConflict { value: Value },
    /// Both sides changed differently
    Resolved(ResolvedConflict),
}

impl Reconciliation {
    /// The value to keep.
    #[must_use]
    pub const fn value(&self) -> &Value {
        match self {
            Self::NoConflict { value } => value,
            Self::Resolved(resolved) => &resolved.resolved_value,
        }
    }

    #[must_use]
    pub const fn needs_review(&self) -> bool {
        matches!(self, Self::Resolved(r) if r.manual_review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_names() {
        assert_eq!(ConflictStrategy::default(), ConflictStrategy::LastWriteWins);
        assert_eq!(ConflictStrategy::from_name("server-wins"), ConflictStrategy::ServerWins);
        assert_eq!(ConflictStrategy::from_name(" Manual "), ConflictStrategy::Manual);
        assert_eq!(ConflictStrategy::from_name("newest"), ConflictStrategy::LastWriteWins);
        assert_eq!(ConflictStrategy::ClientWins.to_string(), "client-wins");
    }

    #[test]
    fn test_strategy_serde() {
        let json = serde_json::to_string(&ConflictStrategy::LastWriteWins).unwrap();
        assert_eq!(json, "\"last-write-wins\"");

        let parsed: ConflictStrategy = serde_json::from_str("\"client-wins\"").unwrap();
        assert_eq!(parsed, ConflictStrategy::ClientWins);
    }

    #[test]
    fn test_manual_review_omitted_when_false() {
        let resolved = ResolvedConflict {
            operation_id: "op-1".to_string(),
            strategy: ConflictStrategy::ServerWins,
            resolved_value: Value::Null,
            manual_review: false,
        };
        let json = serde_json::to_value(&resolved).unwrap();
        assert!(json.get("manual_review").is_none());
    }
}
