//! Configuration management for todosync.
//!
//! This module handles loading and saving configuration from `~/.todosync/`.

mod paths;
mod settings;

pub use paths::{Paths, HOME_ENV};
pub use settings::{ColorSetting, Config, GeneralConfig, SyncConfig};
