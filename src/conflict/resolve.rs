use serde_json::Value;

use super::detect::values_equal;
use super::types::{ConflictInfo, ConflictStrategy, FieldType, ResolvedConflict};

/// Pick the value to keep for a conflict.
///
/// Pure: the result depends only on `conflict` and `strategy`.
#[must_use]
pub fn resolve_conflict(conflict: &ConflictInfo, strategy: ConflictStrategy) -> ResolvedConflict {
    let (resolved_value, manual_review) = match strategy {
        ConflictStrategy::ClientWins => (conflict.local_version.clone(), false),
        ConflictStrategy::LastWriteWins => (last_write(conflict).clone(), false),
        ConflictStrategy::ServerWins => (conflict.remote_version.clone(), false),
        ConflictStrategy::Manual => (conflict.local_version.clone(), true),
    };

    ResolvedConflict {
        operation_id: conflict.operation_id.clone(),
        strategy,
        resolved_value,
        manual_review,
    }
}

fn last_write(conflict: &ConflictInfo) -> &Value {
    match conflict.remote_timestamp {
        Some(remote) if remote > conflict.timestamp => &conflict.remote_version,
        _ => &conflict.local_version,
    }
}

/// Merge a single field according to its shape.
///
/// Arrays become the union of both sides (local elements first, duplicates
/// dropped). Objects are merged shallowly with local keys winning. Scalars,
/// and values that do not match `field_type`, keep the local value.
#[must_use]
pub fn merge_field(conflict: &ConflictInfo, field_type: FieldType) -> ResolvedConflict {
    let local = &conflict.local_version;
    let remote = &conflict.remote_version;

    let resolved_value = match (field_type, local, remote) {
        (FieldType::Array, Value::Array(local), Value::Array(remote)) => {
            let mut merged: Vec<Value> = Vec::with_capacity(local.len() + remote.len());
            for item in local.iter().chain(remote) {
                if !merged.iter().any(|seen| values_equal(seen, item)) {
                    merged.push(item.clone());
                }
            }
            Value::Array(merged)
        }
        (FieldType::Object, Value::Object(local), Value::Object(remote)) => {
            let mut merged = remote.clone();
            for (key, value) in local {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        _ => local.clone(),
    };

    ResolvedConflict {
        operation_id: conflict.operation_id.clone(),
        strategy: ConflictStrategy::LastWriteWins,
        resolved_value,
        manual_review: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::EntityType;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn conflict(local: Value, remote: Value) -> ConflictInfo {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        ConflictInfo::new("op-42", EntityType::Task, "t1", local, remote, at)
    }

    #[test]
    fn test_server_wins() {
        let c = conflict(json!({"title": "A"}), json!({"title": "B"}));
        let resolved = resolve_conflict(&c, ConflictStrategy::ServerWins);

        assert_eq!(resolved.resolved_value, json!({"title": "B"}));
        assert_eq!(resolved.operation_id, "op-42");
        assert_eq!(resolved.strategy, ConflictStrategy::ServerWins);
        assert!(!resolved.manual_review);
    }

    #[test]
    fn test_client_wins_and_manual_keep_local() {
        let c = conflict(json!({"title": "A"}), json!({"title": "B"}));

        let client = resolve_conflict(&c, ConflictStrategy::ClientWins);
        assert_eq!(client.resolved_value, json!({"title": "A"}));

        let manual = resolve_conflict(&c, ConflictStrategy::Manual);
        assert_eq!(manual.resolved_value, json!({"title": "A"}));
        assert!(manual.manual_review);
    }

    #[test]
    fn test_last_write_wins_without_remote_time_keeps_local() {
        let c = conflict(json!("local"), json!("remote"));
        let resolved = resolve_conflict(&c, ConflictStrategy::LastWriteWins);
        assert_eq!(resolved.resolved_value, json!("local"));
    }

    #[test]
    fn test_last_write_wins_compares_timestamps() {
        let base = conflict(json!("local"), json!("remote"));

        let newer = base.clone().with_remote_timestamp(base.timestamp + Duration::seconds(1));
        assert_eq!(
            resolve_conflict(&newer, ConflictStrategy::LastWriteWins).resolved_value,
            json!("remote")
        );

        let older = base.clone().with_remote_timestamp(base.timestamp - Duration::seconds(1));
        assert_eq!(
            resolve_conflict(&older, ConflictStrategy::LastWriteWins).resolved_value,
            json!("local")
        );

        // Ties go to local
        let tied = base.clone().with_remote_timestamp(base.timestamp);
        assert_eq!(
            resolve_conflict(&tied, ConflictStrategy::LastWriteWins).resolved_value,
            json!("local")
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let c = conflict(json!({"n": 1}), json!({"n": 2}));
        for strategy in [
            ConflictStrategy::LastWriteWins,
            ConflictStrategy::ClientWins,
            ConflictStrategy::ServerWins,
            ConflictStrategy::Manual,
        ] {
            assert_eq!(resolve_conflict(&c, strategy), resolve_conflict(&c, strategy));
        }
    }

    #[test]
    fn test_merge_array_union() {
        let c = conflict(json!(["a", "b", "a"]), json!(["b", "c"]));
        let merged = merge_field(&c, FieldType::Array);

        assert_eq!(merged.resolved_value, json!(["a", "b", "c"]));
        assert_eq!(merged.strategy, ConflictStrategy::LastWriteWins);
    }

    #[test]
    fn test_merge_array_dedups_structurally() {
        let c = conflict(json!([{"id": 1}]), json!([{"id": 1}, {"id": 2}]));
        let merged = merge_field(&c, FieldType::Array);
        assert_eq!(merged.resolved_value, json!([{"id": 1}, {"id": 2}]));
    }

    #[test]
    fn test_merge_array_treats_integer_and_float_as_duplicates() {
        let c = conflict(json!([1, 2]), json!([1.0, 3]));
        let merged = merge_field(&c, FieldType::Array);
        assert_eq!(merged.resolved_value, json!([1, 2, 3]));
    }

    #[test]
    fn test_merge_object_local_keys_win() {
        let c = conflict(
            json!({"title": "local", "priority": 1}),
            json!({"title": "remote", "due": "2024-06-01"}),
        );
        let merged = merge_field(&c, FieldType::Object);

        assert_eq!(
            merged.resolved_value,
            json!({"title": "local", "priority": 1, "due": "2024-06-01"})
        );
    }

    #[test]
    fn test_merge_scalars_keep_local() {
        let c = conflict(json!(3), json!(5));
        assert_eq!(merge_field(&c, FieldType::Number).resolved_value, json!(3));

        let c = conflict(json!("mine"), json!("theirs"));
        assert_eq!(merge_field(&c, FieldType::String).resolved_value, json!("mine"));
    }

    #[test]
    fn test_merge_mismatched_shape_keeps_local() {
        let c = conflict(json!("not an array"), json!(["x"]));
        assert_eq!(
            merge_field(&c, FieldType::Array).resolved_value,
            json!("not an array")
        );
    }
}
