//! Command implementations for todosync.
//!
//! Each command returns the text to print; `main` does the printing.

mod completions;
mod conflict;
mod sync;

use std::sync::Arc;

pub use completions::completions;
pub use conflict::conflict;
pub use sync::{clear, enqueue, list, run, status};

use crate::cli::args::OutputFormat;
use crate::config::{Config, Paths};
use crate::error::TodoSyncError;
use crate::storage::Database;
use crate::sync::{ConnectivityMonitor, StubTransport, SyncEngine, SyncQueue};

/// Environment shared by all commands.
#[derive(Debug, Clone)]
pub struct Context {
    pub paths: Paths,
    pub config: Config,
    pub format: OutputFormat,
    pub offline: bool,
}

impl Context {
    /// Resolve paths and load the config file.
    ///
    /// An explicit `output` overrides `general.default_output`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be determined or the
    /// config file cannot be parsed.
    pub fn load(output: Option<OutputFormat>, offline: bool) -> Result<Self, TodoSyncError> {
        let paths = Paths::new()?;
        let config = Config::load_from_path(&paths.config_file)?;
        Ok(Self::new(paths, config, output, offline))
    }

    #[must_use]
    pub fn new(paths: Paths, config: Config, output: Option<OutputFormat>, offline: bool) -> Self {
        let format = output.unwrap_or(config.general.default_output);
        Self {
            paths,
            config,
            format,
            offline,
        }
    }

    fn open_queue(&self) -> Result<Arc<SyncQueue>, TodoSyncError> {
        self.paths.ensure_dirs()?;
        let db = Database::open_at(&self.paths.database)?;
        Ok(Arc::new(SyncQueue::with_database(db)))
    }

    /// Engine over the on-disk queue, talking to the stub transport.
    fn engine(&self, queue: Arc<SyncQueue>) -> (SyncEngine, ConnectivityMonitor) {
        let monitor = ConnectivityMonitor::new(!self.offline);
        let transport = Arc::new(StubTransport::new(self.config.sync.transport_latency()));
        let engine = SyncEngine::new(
            queue,
            transport,
            self.config.sync.engine(),
            monitor.subscribe(),
        );
        (engine, monitor)
    }
}
