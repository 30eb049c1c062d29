//! Conflict detection and resolution.
//!
//! Everything here is a pure function of its inputs: no storage, no clock,
//! no engine state. Safe to call repeatedly and from any thread.

mod detect;
mod resolve;
mod types;

pub use detect::{detect_conflict, reconcile, values_equal};
pub use resolve::{merge_field, resolve_conflict};
pub use types::{ConflictInfo, ConflictStrategy, FieldType, Reconciliation, ResolvedConflict};
