//! Conflict commands.

use chrono::Utc;

use super::Context;
use crate::cli::args::ConflictCommands;
use crate::conflict::{detect_conflict, merge_field, reconcile, resolve_conflict, ConflictInfo};
use crate::error::TodoSyncError;
use crate::output::{format_detection, format_reconciliation, format_resolution};
use crate::sync::EntityType;

/// Execute conflict subcommands.
///
/// # Errors
///
/// Returns an error if output formatting fails.
pub fn conflict(ctx: &Context, cmd: ConflictCommands) -> Result<String, TodoSyncError> {
    let default_strategy = ctx.config.sync.default_strategy;

    match cmd {
        ConflictCommands::Detect {
            local,
            remote,
            base,
        } => format_detection(detect_conflict(&local, &remote, &base), ctx.format),
        ConflictCommands::Resolve {
            local,
            remote,
            strategy,
            field_type,
            local_time,
            remote_time,
            operation_id,
            entity_type,
            entity_id,
        } => {
            let mut info = ConflictInfo::new(
                operation_id,
                entity_type,
                entity_id,
                local,
                remote,
                local_time.unwrap_or_else(Utc::now),
            );
            info.remote_timestamp = remote_time;

            let resolved = match field_type {
                Some(field_type) => merge_field(&info, field_type),
                None => resolve_conflict(&info, strategy.unwrap_or(default_strategy)),
            };
            format_resolution(&resolved, ctx.format)
        }
        ConflictCommands::Reconcile {
            local,
            remote,
            base,
            strategy,
        } => {
            let info = ConflictInfo::new("op-manual", EntityType::Task, "", local, remote, Utc::now());
            let outcome = reconcile(&info, &base, strategy.unwrap_or(default_strategy));
            format_reconciliation(&outcome, ctx.format)
        }
    }
}
