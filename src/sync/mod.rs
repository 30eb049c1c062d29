//! Offline-first sync.
//!
//! Local mutations are recorded as [`PendingOperation`]s in a durable
//! [`SyncQueue`] and mirrored in memory. The [`SyncEngine`] drains them in
//! FIFO order against a [`RemoteTransport`] whenever the device is online,
//! retrying failures with exponential backoff up to a ceiling.

mod backoff;
mod connectivity;
mod engine;
mod log;
mod operation;
mod pending;
mod queue;
mod result;
mod transport;

pub use backoff::BackoffPolicy;
pub use connectivity::ConnectivityMonitor;
pub use engine::{EngineConfig, SyncEngine, SyncStatus};
pub use log::{SyncLog, SyncLogEntry, SyncLogStatus};
pub use operation::{EntityType, OperationKind, Payload, PendingOperation, QueueRow, PAYLOAD_SCHEMA_VERSION};
pub use pending::PendingLog;
pub use queue::{QueueStats, QueueStore, SyncQueue};
pub use result::{ExecutionResult, SyncResult};
pub use transport::{RemoteTransport, StubTransport, TransportError};
