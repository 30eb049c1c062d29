//! The sync engine.
//!
//! Owns the pending operation log and sync state, drains the log against a
//! [`RemoteTransport`] one operation at a time, and reacts to connectivity
//! changes. One engine per process; clone the handle to share it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;
use super::log::{SyncLog, SyncLogEntry, SyncLogStatus};
use super::operation::{EntityType, OperationKind, Payload, PendingOperation};
use super::pending::PendingLog;
use super::queue::QueueStore;
use super::result::{ExecutionResult, SyncResult};
use super::transport::{RemoteTransport, TransportError};
use crate::error::TodoSyncError;

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Failed attempts after which an operation is no longer retried automatically
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
    /// Check connectivity before each attempt and stop the pass when offline
    pub abort_when_offline: bool,
    pub log_retention_days: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
            abort_when_offline: true,
            log_retention_days: 30,
        }
    }
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub is_online: bool,
    pub is_syncing: bool,
    pub pending_operations: Vec<PendingOperation>,
    pub sync_logs: Vec<SyncLogEntry>,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct SyncState {
    is_online: bool,
    is_syncing: bool,
    pending: PendingLog,
    logs: SyncLog,
    last_sync_at: Option<DateTime<Utc>>,
    error: Option<String>,
}

struct Inner {
    store: Arc<dyn QueueStore>,
    transport: Arc<dyn RemoteTransport>,
    config: EngineConfig,
    state: Mutex<SyncState>,
    connectivity: Mutex<Option<watch::Receiver<bool>>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let listener = self
            .listener
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = listener.take() {
            handle.abort();
        }
    }
}

/// Clears the single-flight flag even if the drain future is dropped mid-pass.
struct DrainGuard<'a> {
    inner: &'a Inner,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.inner.state().is_syncing = false;
    }
}

/// Handle to the process-wide sync engine.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state())
            .finish_non_exhaustive()
    }
}

impl SyncEngine {
    /// Build an engine. The initial online flag is read from `connectivity`.
    ///
    /// Call [`start`](Self::start) to begin reacting to connectivity changes.
    #[must_use]
    pub fn new(
        store: Arc<dyn QueueStore>,
        transport: Arc<dyn RemoteTransport>,
        config: EngineConfig,
        connectivity: watch::Receiver<bool>,
    ) -> Self {
        let state = SyncState {
            is_online: *connectivity.borrow(),
            ..SyncState::default()
        };

        Self {
            inner: Arc::new(Inner {
                store,
                transport,
                config,
                state: Mutex::new(state),
                connectivity: Mutex::new(Some(connectivity)),
                listener: Mutex::new(None),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    fn state(&self) -> MutexGuard<'_, SyncState> {
        self.inner.state()
    }

    fn record_error(&self, err: &TodoSyncError) {
        self.state().error = Some(err.to_string());
    }

    /// Spawn the connectivity listener on the current tokio runtime.
    ///
    /// A reconnect (offline to online) triggers one drain pass. Calling this
    /// twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when called outside a tokio runtime.
    pub fn start(&self) -> Result<(), TodoSyncError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TodoSyncError::Config(format!("No async runtime available: {e}")))?;

        let Some(rx) = self
            .inner
            .connectivity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return Ok(());
        };

        let handle = runtime.spawn(listen(Arc::downgrade(&self.inner), rx));
        *self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        debug!("connectivity listener started");
        Ok(())
    }

    /// Stop the connectivity listener. An in-flight drain pass is not cancelled.
    pub fn shutdown(&self) {
        let handle = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(handle) = handle {
            handle.abort();
            debug!("connectivity listener stopped");
        }
    }

    /// Load unsynced rows from the durable store and prune the sync log.
    ///
    /// Retry counters start from zero. Returns the number of loaded operations.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be scanned; the in-memory log is
    /// left unchanged.
    pub fn initialize(&self) -> Result<usize, TodoSyncError> {
        let rows = self.inner.store.scan_all().map_err(|e| {
            warn!(error = %e, "failed to load sync queue");
            self.record_error(&e);
            e
        })?;

        let operations: Vec<PendingOperation> = rows
            .into_iter()
            .filter(|row| !row.synced)
            .map(PendingOperation::from)
            .collect();
        let loaded = operations.len();

        let pruned = {
            let mut state = self.state();
            state.pending.replace(operations);
            state
                .logs
                .prune_older_than(self.inner.config.log_retention_days)
        };

        info!(loaded, pruned, "sync queue initialized");
        Ok(loaded)
    }

    /// Persist a new operation and append it to the pending log.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable write fails. The operation is then
    /// not in the pending log and the caller must retry the mutation.
    pub fn enqueue(
        &self,
        kind: OperationKind,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        data: Payload,
    ) -> Result<PendingOperation, TodoSyncError> {
        let operation = PendingOperation::new(kind, entity_type, entity_id, data);

        if let Err(e) = self.inner.store.insert(&operation.to_row()) {
            warn!(error = %e, op = %operation.label(), "failed to persist operation");
            self.record_error(&e);
            return Err(e);
        }

        self.state().pending.push(operation.clone());
        info!(id = %operation.id, op = %operation.label(), entity_id = %operation.entity_id, "operation queued");

        Ok(operation)
    }

    /// Flag an operation synced and drop it from the pending log.
    ///
    /// Returns `false` without touching the store when the id is not pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the durable update fails; the operation stays pending.
    pub fn mark_synced(&self, operation_id: &str) -> Result<bool, TodoSyncError> {
        if !self.state().pending.contains(operation_id) {
            return Ok(false);
        }

        if let Err(e) = self.inner.store.mark_synced(operation_id) {
            warn!(id = operation_id, error = %e, "failed to mark operation synced");
            self.record_error(&e);
            return Err(e);
        }

        self.state().pending.remove(operation_id);
        Ok(true)
    }

    /// Run one drain pass over a snapshot of the pending log.
    ///
    /// Returns `None` without doing anything when offline, when a pass is
    /// already running, or when nothing is pending. Operations queued during
    /// the pass wait for the next one.
    pub async fn sync_pending_operations(&self) -> Option<SyncResult> {
        let snapshot = {
            let mut state = self.state();
            if !state.is_online || state.is_syncing || state.pending.is_empty() {
                debug!(
                    online = state.is_online,
                    syncing = state.is_syncing,
                    pending = state.pending.len(),
                    "drain pass skipped"
                );
                return None;
            }
            state.is_syncing = true;
            state.pending.snapshot()
        };
        let _guard = DrainGuard { inner: &self.inner };

        info!(operations = snapshot.len(), "drain pass started");
        let config = self.inner.config;
        let mut result = SyncResult::empty();

        for queued in snapshot {
            if config.abort_when_offline && !self.is_online() {
                warn!("went offline, abandoning rest of drain pass");
                result.aborted = true;
                break;
            }

            // Retry counters may have moved since the snapshot was taken
            let current = { self.state().pending.get(&queued.id).cloned() };
            let Some(operation) = current else {
                continue;
            };

            if operation.is_exhausted(config.max_retries) {
                result.add(skipped(&operation));
                continue;
            }

            let delay = config.backoff.delay(operation.retries);
            if !delay.is_zero() {
                debug!(id = %operation.id, retries = operation.retries, ?delay, "backing off");
                tokio::time::sleep(delay).await;
            }

            let outcome = self.inner.transport.apply(&operation).await;
            result.add(self.record_outcome(&operation, outcome));
        }

        self.state().last_sync_at = Some(Utc::now());
        info!(
            succeeded = result.succeeded,
            failed = result.failed,
            skipped = result.skipped,
            aborted = result.aborted,
            "drain pass finished"
        );

        Some(result)
    }

    fn record_outcome(
        &self,
        operation: &PendingOperation,
        outcome: Result<(), TransportError>,
    ) -> ExecutionResult {
        let mut execution = ExecutionResult {
            id: operation.id.clone(),
            kind: operation.kind,
            entity_type: operation.entity_type,
            entity_id: operation.entity_id.clone(),
            success: false,
            error: None,
            skipped: false,
            retries: operation.retries,
        };

        match outcome {
            Ok(()) => match self.mark_synced(&operation.id) {
                Ok(_) => {
                    debug!(id = %operation.id, op = %operation.label(), "operation synced");
                    self.state().logs.push(SyncLogEntry::new(
                        operation.label(),
                        SyncLogStatus::Success,
                        None,
                    ));
                    execution.success = true;
                }
                Err(e) => {
                    // Delivered but not durably acknowledged; resent next pass
                    let message = e.to_string();
                    self.state().logs.push(SyncLogEntry::new(
                        operation.label(),
                        SyncLogStatus::Pending,
                        Some(message.clone()),
                    ));
                    execution.error = Some(message);
                }
            },
            Err(e) => {
                let message = e.to_string();
                let max_retries = self.inner.config.max_retries;
                let mut state = self.state();

                let retries = match state.pending.get_mut(&operation.id) {
                    Some(pending) => {
                        pending.retries += 1;
                        pending.last_error = Some(message.clone());
                        pending.retries
                    }
                    None => operation.retries + 1,
                };
                let status = if retries >= max_retries {
                    SyncLogStatus::Failed
                } else {
                    SyncLogStatus::Pending
                };

                state.logs.push(SyncLogEntry::new(
                    operation.label(),
                    status,
                    Some(message.clone()),
                ));
                drop(state);

                warn!(id = %operation.id, op = %operation.label(), retries, %status, error = %message, "sync attempt failed");
                execution.retries = retries;
                execution.error = Some(message);
            }
        }

        execution
    }

    /// Forgive one failure on every operation still below the retry ceiling,
    /// then run a drain pass.
    ///
    /// Operations at the ceiling are untouched; use
    /// [`reset_operation`](Self::reset_operation) for those.
    pub async fn retry_failed_operations(&self) -> Option<SyncResult> {
        let max_retries = self.inner.config.max_retries;
        let eligible = {
            let mut state = self.state();
            let mut eligible = 0;
            for operation in state.pending.iter_mut() {
                if operation.retries < max_retries {
                    operation.retries = operation.retries.saturating_sub(1);
                    eligible += 1;
                }
            }
            eligible
        };

        if eligible == 0 {
            debug!("no retryable operations");
            return None;
        }

        self.sync_pending_operations().await
    }

    /// Clear the retry counter and last error of one operation, including one
    /// parked at the retry ceiling.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the operation is not pending.
    pub fn reset_operation(&self, operation_id: &str) -> Result<PendingOperation, TodoSyncError> {
        let mut state = self.state();
        let operation = state
            .pending
            .get_mut(operation_id)
            .ok_or_else(|| TodoSyncError::NotFound(format!("Operation {operation_id}")))?;

        operation.retries = 0;
        operation.last_error = None;
        info!(id = operation_id, "operation reset for retry");

        Ok(operation.clone())
    }

    /// Record a connectivity change, draining once on reconnect.
    pub async fn set_online_status(&self, online: bool) {
        if self.update_online(online) {
            self.sync_pending_operations().await;
        }
    }

    /// Returns whether this was an offline to online transition.
    fn update_online(&self, online: bool) -> bool {
        let was_online = {
            let mut state = self.state();
            std::mem::replace(&mut state.is_online, online)
        };

        if was_online != online {
            info!(online, "sync engine connectivity changed");
        }
        online && !was_online
    }

    /// Remove sync log entries older than `days` days.
    pub fn clear_old_logs(&self, days: u32) -> usize {
        let removed = self.state().logs.prune_older_than(days);
        debug!(removed, days, "sync log pruned");
        removed
    }

    pub fn clear_error(&self) {
        self.state().error = None;
    }

    #[must_use]
    pub fn is_online(&self) -> bool {
        self.state().is_online
    }

    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.state().is_syncing
    }

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    #[must_use]
    pub fn pending_operations(&self) -> Vec<PendingOperation> {
        self.state().pending.snapshot()
    }

    /// Operations parked at the retry ceiling.
    #[must_use]
    pub fn exhausted_operations(&self) -> Vec<PendingOperation> {
        self.state()
            .pending
            .exhausted(self.inner.config.max_retries)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        let state = self.state();
        SyncStatus {
            is_online: state.is_online,
            is_syncing: state.is_syncing,
            pending_operations: state.pending.snapshot(),
            sync_logs: state.logs.entries().to_vec(),
            last_sync_at: state.last_sync_at,
            error: state.error.clone(),
        }
    }
}

fn skipped(operation: &PendingOperation) -> ExecutionResult {
    ExecutionResult {
        id: operation.id.clone(),
        kind: operation.kind,
        entity_type: operation.entity_type,
        entity_id: operation.entity_id.clone(),
        success: false,
        error: operation.last_error.clone(),
        skipped: true,
        retries: operation.retries,
    }
}

async fn listen(engine: Weak<Inner>, mut rx: watch::Receiver<bool>) {
    while rx.changed().await.is_ok() {
        let online = *rx.borrow_and_update();
        let Some(inner) = engine.upgrade() else {
            break;
        };
        let engine = SyncEngine { inner };

        if engine.update_online(online) {
            tokio::spawn(async move {
                engine.sync_pending_operations().await;
            });
        }
    }
    debug!("connectivity source closed");
}
