//! Storage layer for todosync.
//!
//! SQLite-backed persistence for the durable sync queue.

mod database;
mod migrations;

pub use database::Database;
