use serde_json::{Number, Value};

use super::resolve::resolve_conflict;
use super::types::{ConflictInfo, ConflictStrategy, Reconciliation};

/// Three-way conflict check using deep equality.
///
/// A conflict needs both sides to have moved away from `last_known`, and to
/// have landed on different values.
#[must_use]
pub fn detect_conflict(local: &Value, remote: &Value, last_known: &Value) -> bool {
    !values_equal(local, last_known)
        && !values_equal(remote, last_known)
        && !values_equal(local, remote)
}

/// Structural equality for JSON values.
///
/// Numbers compare by value, so `1` and `1.0` are equal. Object key order is
/// ignored, array order is not.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => numbers_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| values_equal(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
        }
        _ => a == b,
    }
}

#[allow(clippy::float_cmp)]
fn numbers_equal(a: &Number, b: &Number) -> bool {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a == b;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Decide what to keep for one entity given the last value both sides agreed on.
///
/// Without a conflict the side that changed wins (remote when local still
/// equals `last_known`). With a conflict, `strategy` decides.
#[must_use]
pub fn reconcile(info: &ConflictInfo, last_known: &Value, strategy: ConflictStrategy) -> Reconciliation {
    if detect_conflict(&info.local_version, &info.remote_version, last_known) {
        return Reconciliation::Resolved(resolve_conflict(info, strategy));
    }

    let value = if values_equal(&info.local_version, last_known) {
        info.remote_version.clone()
    } else {
        info.local_version.clone()
    };
    Reconciliation::NoConflict { value }
}
