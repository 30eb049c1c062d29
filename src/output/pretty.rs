use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::Value;

use crate::conflict::{Reconciliation, ResolvedConflict};
use crate::sync::{PendingOperation, QueueStats, SyncResult, SyncStatus};

/// Format queue statistics and engine state
pub fn format_status_pretty(stats: &QueueStats, status: &SyncStatus) -> String {
    let mut lines = Vec::new();

    lines.push("Sync Queue Status".bold().to_string());
    lines.push("─".repeat(40));

    let connectivity = if status.is_online {
        "online".green()
    } else {
        "offline".yellow()
    };
    lines.push(format!("  Network:    {connectivity}"));

    lines.push(format!(
        "  Pending:    {} {}",
        stats.pending,
        if stats.pending > 0 {
            "operations waiting".dimmed()
        } else {
            "".dimmed()
        }
    ));
    lines.push(format!("  Synced:     {} {}", stats.synced, "operations".dimmed()));

    if let Some(oldest) = stats.oldest_pending {
        lines.push(format!("  Oldest:     {}", relative_age(oldest).dimmed()));
    }

    if let Some(error) = &status.error {
        lines.push(format!("  Error:      {}", error.red()));
    }

    if stats.pending > 0 {
        lines.push(String::new());
        lines.push(
            "Run 'todosync run' to send pending operations"
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format pending operations as a table
pub fn format_operations_pretty(operations: &[PendingOperation], limit: usize) -> String {
    if operations.is_empty() {
        return "No pending operations in queue.".to_string();
    }

    let mut lines = Vec::new();
    lines.push(format!("Pending Operations ({})", operations.len()));
    lines.push("─".repeat(72));
    lines.push(format!(
        "{:<42} {:<16} {:<20}",
        "ID", "Operation", "Created"
    ));
    lines.push("─".repeat(72));

    for op in operations.iter().take(limit) {
        lines.push(format!(
            "{:<42} {:<16} {:<20}",
            op.id,
            op.label(),
            op.created_at.format("%Y-%m-%d %H:%M")
        ));
        lines.push(format!("  {}", format!("→ {}", op.entity_id).dimmed()));

        if let Some(error) = &op.last_error {
            lines.push(format!("  {}", truncate(error, 60).red()));
        }
    }

    if operations.len() > limit {
        lines.push(
            format!("… and {} more", operations.len() - limit)
                .dimmed()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format the result of one or more drain passes
pub fn format_sync_result_pretty(result: &SyncResult) -> String {
    let mut lines = Vec::new();

    let headline = format!("Sync completed: {} operations", result.total());
    lines.push(if result.all_succeeded() {
        headline.green().to_string()
    } else {
        headline.red().to_string()
    });
    lines.push("─".repeat(40));

    if result.succeeded > 0 {
        lines.push(format!(
            "  {} {}",
            "✓".green(),
            format!("{} succeeded", result.succeeded).green()
        ));
    }

    if result.failed > 0 {
        lines.push(format!(
            "  {} {}",
            "✗".red(),
            format!("{} failed", result.failed).red()
        ));
    }

    if result.skipped > 0 {
        lines.push(format!(
            "  {} {}",
            "○".yellow(),
            format!("{} skipped (retry limit reached)", result.skipped).yellow()
        ));
    }

    if result.aborted {
        lines.push(format!(
            "  {} {}",
            "!".yellow(),
            "stopped early: went offline".yellow()
        ));
    }

    // Show first few errors
    let errors: Vec<_> = result
        .results
        .iter()
        .filter(|r| !r.skipped && r.error.is_some())
        .take(3)
        .collect();

    if !errors.is_empty() {
        lines.push(String::new());
        lines.push("Errors:".to_string());
        for err in errors {
            lines.push(format!(
                "  - {} {}: {}",
                err.kind,
                err.entity_type,
                err.error.as_deref().unwrap_or("Unknown error")
            ));
        }
    }

    lines.join("\n")
}

/// Format a conflict check
pub fn format_detection_pretty(conflict: bool) -> String {
    if conflict {
        format!("{} both sides changed differently", "conflict:".red().bold())
    } else {
        format!("{} no conflict", "✓".green())
    }
}

/// Format a resolved conflict
pub fn format_resolution_pretty(resolved: &ResolvedConflict) -> String {
    let mut lines = vec![
        format!("Resolved with {}", resolved.strategy.to_string().cyan()),
        "─".repeat(40),
        compact(&resolved.resolved_value),
    ];

    if resolved.manual_review {
        lines.push(String::new());
        lines.push(
            "Needs manual review: value is provisional"
                .yellow()
                .to_string(),
        );
    }

    lines.join("\n")
}

/// Format the outcome of a reconcile
pub fn format_reconciliation_pretty(reconciliation: &Reconciliation) -> String {
    match reconciliation {
        Reconciliation::NoConflict { value } => {
            format!("{}\n{}", format_detection_pretty(false), compact(value))
        }
        Reconciliation::Resolved(resolved) => format!(
            "{}\n{}",
            format_detection_pretty(true),
            format_resolution_pretty(resolved)
        ),
    }
}

fn compact(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

fn relative_age(at: DateTime<Utc>) -> String {
    let age = Utc::now().signed_duration_since(at);
    if age.num_hours() > 0 {
        format!("{} hours ago", age.num_hours())
    } else if age.num_minutes() > 0 {
        format!("{} minutes ago", age.num_minutes())
    } else {
        "just now".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}
