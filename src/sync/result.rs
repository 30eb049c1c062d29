//! Outcome of a drain pass.

use serde::Serialize;

use super::operation::{EntityType, OperationKind};

/// Result of attempting a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Operation ID
    pub id: String,
    pub kind: OperationKind,
    pub entity_type: EntityType,
    pub entity_id: String,
    /// Whether the remote acknowledged it
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// Not attempted (already at the retry ceiling)
    pub skipped: bool,
    /// Retry count after this attempt
    pub retries: u32,
}

/// Result of one drain pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    /// Number of successful operations
    pub succeeded: usize,
    /// Number of failed operations
    pub failed: usize,
    /// Number of skipped operations
    pub skipped: usize,
    /// Pass stopped early because connectivity dropped
    pub aborted: bool,
    /// Individual results, in attempt order
    pub results: Vec<ExecutionResult>,
}

impl SyncResult {
    /// Create an empty result.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            succeeded: 0,
            failed: 0,
            skipped: 0,
            aborted: false,
            results: Vec::new(),
        }
    }

    /// Add a result.
    pub fn add(&mut self, result: ExecutionResult) {
        if result.skipped {
            self.skipped += 1;
        } else if result.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.results.push(result);
    }

    /// Check if all attempted operations succeeded.
    #[must_use]
    pub const fn all_succeeded(&self) -> bool {
        self.failed == 0
    }

    /// Get total operations processed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}
