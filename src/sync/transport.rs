//! Remote transport seam.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use super::operation::PendingOperation;

/// Failure reported by a remote transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    #[error("remote rejected operation: {0}")]
    Rejected(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// Delivers operations to the remote system.
///
/// Implementations must treat `operation.id` as an idempotency key: the
/// engine may send the same operation again after a failure.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    async fn apply(&self, operation: &PendingOperation) -> Result<(), TransportError>;
}

/// Stand-in backend: waits a fixed latency, then acknowledges.
#[derive(Debug, Clone)]
pub struct StubTransport {
    latency: Duration,
}

impl StubTransport {
    #[must_use]
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[async_trait]
impl RemoteTransport for StubTransport {
    async fn apply(&self, operation: &PendingOperation) -> Result<(), TransportError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        debug!(id = %operation.id, op = %operation.label(), "stub transport acknowledged");
        Ok(())
    }
}
