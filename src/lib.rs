//! todosync - offline-first sync for task data
//!
//! Local mutations are queued durably and replayed against a remote backend
//! in order, with bounded retries. Divergent local and remote copies are
//! reconciled with pluggable conflict strategies.

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod conflict;
pub mod error;
pub mod output;
pub mod storage;
pub mod sync;

pub use cli::args::{Cli, Commands, OutputFormat};
pub use error::{Result, TodoSyncError};
pub use sync::SyncEngine;
