//! Sync queue commands.

use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::debug;

use super::Context;
use crate::cli::args::{EnqueueArgs, OutputFormat};
use crate::error::TodoSyncError;
use crate::output::{format_operations, format_status, format_sync_result, to_json};
use crate::sync::{Payload, QueueStore, SyncResult};

/// Show queue statistics and engine state.
///
/// # Errors
///
/// Returns an error if the queue cannot be read.
pub fn status(ctx: &Context) -> Result<String, TodoSyncError> {
    let queue = ctx.open_queue()?;
    let (engine, _monitor) = ctx.engine(queue.clone());
    engine.initialize()?;

    let stats = queue.stats()?;
    format_status(&stats, &engine.status(), ctx.format)
}

/// Queue a local mutation.
///
/// # Errors
///
/// Returns an error if the operation cannot be persisted.
pub fn enqueue(ctx: &Context, args: EnqueueArgs) -> Result<String, TodoSyncError> {
    let queue = ctx.open_queue()?;
    let (engine, _monitor) = ctx.engine(queue);

    let data = Payload::new(args.data.unwrap_or(Value::Null));
    let operation = engine.enqueue(args.kind, args.entity_type, args.entity_id, data)?;

    match ctx.format {
        OutputFormat::Json => to_json(&operation),
        OutputFormat::Pretty => Ok(format!(
            "Queued {} {} (ID: {})",
            operation.label(),
            operation.entity_id,
            operation.id
        )),
    }
}

/// List pending operations.
///
/// # Errors
///
/// Returns an error if the queue cannot be read.
pub fn list(ctx: &Context, limit: usize) -> Result<String, TodoSyncError> {
    let queue = ctx.open_queue()?;
    let (engine, _monitor) = ctx.engine(queue);
    engine.initialize()?;

    format_operations(&engine.pending_operations(), limit, ctx.format)
}

/// Drain pending operations, up to `passes` times.
///
/// Later passes only run while something is still pending.
///
/// # Errors
///
/// Returns an error if the queue cannot be loaded.
pub async fn run(ctx: &Context, passes: u32) -> Result<String, TodoSyncError> {
    let queue = ctx.open_queue()?;
    let (engine, _monitor) = ctx.engine(queue);
    let pending = engine.initialize()?;

    if pending == 0 {
        return match ctx.format {
            OutputFormat::Json => format_sync_result(&SyncResult::empty(), ctx.format),
            OutputFormat::Pretty => Ok("No pending operations to sync.".to_string()),
        };
    }

    if !engine.is_online() {
        return match ctx.format {
            OutputFormat::Json => to_json(&serde_json::json!({
                "online": false,
                "pending": pending,
            })),
            OutputFormat::Pretty => Ok(format!(
                "Offline: {pending} operations waiting. Nothing was sent."
            )),
        };
    }

    let mut combined = SyncResult::empty();
    for pass in 1..=passes.max(1) {
        let Some(result) = engine.sync_pending_operations().await else {
            break;
        };
        debug!(pass, succeeded = result.succeeded, failed = result.failed, "pass done");

        combined.aborted |= result.aborted;
        for execution in result.results {
            combined.add(execution);
        }
    }

    format_sync_result(&combined, ctx.format)
}

/// Remove synced operations older than `older_than` hours.
///
/// # Errors
///
/// Returns an error if the purge fails.
pub fn clear(ctx: &Context, older_than: i64) -> Result<String, TodoSyncError> {
    if older_than < 0 {
        return Err(TodoSyncError::InvalidInput(
            "--older-than must not be negative".to_string(),
        ));
    }

    let queue = ctx.open_queue()?;
    let count = queue.purge_synced(Utc::now() - Duration::hours(older_than))?;

    match ctx.format {
        OutputFormat::Json => to_json(&serde_json::json!({ "cleared": count })),
        OutputFormat::Pretty => Ok(format!(
            "Cleared {count} synced operations older than {older_than} hours"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Paths};
    use crate::sync::{EntityType, OperationKind};
    use serde_json::json;
    use tempfile::TempDir;

    fn context(dir: &TempDir, offline: bool) -> Context {
        let mut config = Config::default();
        config.sync.transport_latency_ms = 0;
        Context::new(
            Paths::with_root(dir.path().to_path_buf()),
            config,
            Some(OutputFormat::Json),
            offline,
        )
    }

    fn enqueue_args(entity_id: &str) -> EnqueueArgs {
        EnqueueArgs {
            kind: OperationKind::Create,
            entity_type: EntityType::Task,
            entity_id: entity_id.to_string(),
            data: Some(json!({"content": "Write report"})),
        }
    }

    fn parse(output: &str) -> Value {
        serde_json::from_str(output).unwrap()
    }

    #[test]
    fn test_enqueue_then_list() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, false);

        enqueue(&ctx, enqueue_args("t1")).unwrap();
        enqueue(&ctx, enqueue_args("t2")).unwrap();

        let listed = parse(&list(&ctx, 10).unwrap());
        assert_eq!(listed["count"], 2);
        assert_eq!(listed["items"][0]["entity_id"], "t1");
        assert_eq!(listed["items"][1]["data"]["body"]["content"], "Write report");
    }

    #[tokio::test]
    async fn test_run_drains_queue() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, false);
        enqueue(&ctx, enqueue_args("t1")).unwrap();

        let result = parse(&run(&ctx, 1).await.unwrap());
        assert_eq!(result["succeeded"], 1);

        let stats = parse(&status(&ctx).unwrap());
        assert_eq!(stats["pending"], 0);
        assert_eq!(stats["synced"], 1);
    }

    #[tokio::test]
    async fn test_run_offline_sends_nothing() {
        let dir = TempDir::new().unwrap();
        let online = context(&dir, false);
        enqueue(&online, enqueue_args("t1")).unwrap();

        let offline = context(&dir, true);
        let result = parse(&run(&offline, 1).await.unwrap());
        assert_eq!(result["online"], false);
        assert_eq!(result["pending"], 1);

        let stats = parse(&status(&online).unwrap());
        assert_eq!(stats["pending"], 1);
    }

    #[tokio::test]
    async fn test_clear_removes_synced_rows() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir, false);
        enqueue(&ctx, enqueue_args("t1")).unwrap();
        run(&ctx, 1).await.unwrap();

        // Rows are newer than a day
        assert_eq!(parse(&clear(&ctx, 24).unwrap())["cleared"], 0);
        assert_eq!(parse(&clear(&ctx, 0).unwrap())["cleared"], 1);
    }

    #[test]
    fn test_clear_rejects_negative_hours() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            clear(&context(&dir, false), -1),
            Err(TodoSyncError::InvalidInput(_))
        ));
    }
}
