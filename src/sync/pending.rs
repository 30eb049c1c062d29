//! In-memory mirror of unsynced queue rows.

use serde::Serialize;

use super::operation::PendingOperation;

/// Ordered set of operations still awaiting delivery.
///
/// Insertion order is enqueue order; a drain pass walks a [`snapshot`](Self::snapshot).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PendingLog {
    operations: Vec<PendingOperation>,
}

impl PendingLog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            operations: Vec::new(),
        }
    }

    /// Replace the contents, e.g. after a cold-start scan.
    pub fn replace(&mut self, operations: Vec<PendingOperation>) {
        self.operations = operations;
    }

    pub fn push(&mut self, operation: PendingOperation) {
        self.operations.push(operation);
    }

    /// Remove by id, returning the operation if it was present.
    pub fn remove(&mut self, id: &str) -> Option<PendingOperation> {
        let index = self.operations.iter().position(|op| op.id == id)?;
        Some(self.operations.remove(index))
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PendingOperation> {
        self.operations.iter().find(|op| op.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut PendingOperation> {
        self.operations.iter_mut().find(|op| op.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
        self.operations.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut PendingOperation> {
        self.operations.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Owned copy of the current contents, in order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PendingOperation> {
        self.operations.clone()
    }

    /// Operations whose retries have reached `max_retries`.
    pub fn exhausted(&self, max_retries: u32) -> impl Iterator<Item = &PendingOperation> {
        self.operations
            .iter()
            .filter(move |op| op.is_exhausted(max_retries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::operation::{EntityType, OperationKind, Payload};

    fn op(entity_id: &str) -> PendingOperation {
        PendingOperation::new(
            OperationKind::Update,
            EntityType::Task,
            entity_id,
            Payload::default(),
        )
    }

    #[test]
    fn test_push_preserves_order() {
        let mut log = PendingLog::new();
        log.push(op("a"));
        log.push(op("b"));
        log.push(op("a"));

        let ids: Vec<_> = log.iter().map(|o| o.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut log = PendingLog::new();
        let first = op("a");
        let id = first.id.clone();
        log.push(first);

        assert!(log.remove(&id).is_some());
        assert!(log.remove(&id).is_none());
        assert!(log.is_empty());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut log = PendingLog::new();
        log.push(op("a"));

        let snapshot = log.snapshot();
        log.push(op("b"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_exhausted() {
        let mut log = PendingLog::new();
        let mut stuck = op("a");
        stuck.retries = 3;
        let stuck_id = stuck.id.clone();
        log.push(stuck);
        log.push(op("b"));

        let exhausted: Vec<_> = log.exhausted(3).map(|o| o.id.clone()).collect();
        assert_eq!(exhausted, vec![stuck_id]);
    }
}
