use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::conflict::{ConflictStrategy, FieldType};
use crate::sync::{EntityType, OperationKind};

#[derive(Parser)]
#[command(name = "todosync")]
#[command(about = "Offline-first sync queue and conflict resolver for task data")]
#[command(long_about = "todosync - offline-first sync for task data

Records local mutations in a durable queue, drains them to the remote in
FIFO order with exponential backoff, and resolves conflicts between local
and remote copies.

QUICK START:
  todosync enqueue create task t1 --data '{\"content\":\"Buy milk\"}'
  todosync status                 Show queue and engine state
  todosync run                    Drain pending operations
  todosync conflict detect --local '\"A\"' --remote '\"B\"' --base '\"orig\"'

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting

For more information on a specific command, run:
  todosync <command> --help")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Log engine activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Start the engine offline (nothing is sent)
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show queue statistics and engine state
    Status,

    /// Queue a local mutation
    ///
    /// Examples:
    ///   todosync enqueue create task t1 --data '{"content":"Buy milk"}'
    ///   todosync enqueue delete label urgent
    Enqueue(EnqueueArgs),

    /// List pending operations in enqueue order
    List {
        /// Maximum number of operations to show
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },

    /// Drain pending operations to the remote
    Run {
        /// Maximum number of drain passes
        #[arg(long, default_value = "1")]
        passes: u32,
    },

    /// Remove synced operations from the queue
    Clear {
        /// Only remove operations older than this many hours
        #[arg(long, default_value = "24")]
        older_than: i64,
    },

    /// Detect and resolve conflicts between local and remote values
    Conflict(ConflictArgs),

    /// Generate shell completions
    ///
    /// Example: todosync completions zsh > ~/.zfunc/_todosync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for queueing an operation.
#[derive(Args)]
pub struct EnqueueArgs {
    /// Operation type (create, update, delete)
    #[arg(value_parser = OperationKind::parse)]
    pub kind: OperationKind,

    /// Entity type (task, project, section, label)
    #[arg(value_parser = EntityType::parse)]
    pub entity_type: EntityType,

    /// Id of the affected entity
    pub entity_id: String,

    /// JSON payload (change set or full entity)
    #[arg(short, long, value_parser = parse_json)]
    pub data: Option<Value>,
}

/// Arguments for conflict commands.
#[derive(Args)]
pub struct ConflictArgs {
    #[command(subcommand)]
    pub command: ConflictCommands,
}

/// Conflict subcommands. Values are JSON literals.
#[derive(Subcommand)]
pub enum ConflictCommands {
    /// Check whether both sides diverged from a common base
    Detect {
        #[arg(long, value_parser = parse_json)]
        local: Value,
        #[arg(long, value_parser = parse_json)]
        remote: Value,
        /// Last value both sides agreed on
        #[arg(long, value_parser = parse_json)]
        base: Value,
    },

    /// Pick a winner with a strategy, or merge one field by type
    Resolve {
        #[arg(long, value_parser = parse_json)]
        local: Value,
        #[arg(long, value_parser = parse_json)]
        remote: Value,
        /// Resolution strategy: last-write-wins, client-wins, server-wins or
        /// manual (defaults to `sync.default_strategy`, unknown names mean
        /// last-write-wins)
        #[arg(short, long, value_parser = parse_strategy)]
        strategy: Option<ConflictStrategy>,
        /// Merge as a single field of this type instead of applying a strategy
        #[arg(long, value_enum, conflicts_with = "strategy")]
        field_type: Option<FieldType>,
        /// RFC 3339 time of the local change (defaults to now)
        #[arg(long)]
        local_time: Option<DateTime<Utc>>,
        /// RFC 3339 last-modified time reported by the remote
        #[arg(long)]
        remote_time: Option<DateTime<Utc>>,
        #[arg(long, default_value = "op-manual")]
        operation_id: String,
        #[arg(long, value_parser = EntityType::parse, default_value = "task")]
        entity_type: EntityType,
        #[arg(long, default_value = "")]
        entity_id: String,
    },

    /// Detect, then resolve only if both sides diverged
    Reconcile {
        #[arg(long, value_parser = parse_json)]
        local: Value,
        #[arg(long, value_parser = parse_json)]
        remote: Value,
        #[arg(long, value_parser = parse_json)]
        base: Value,
        #[arg(short, long, value_parser = parse_strategy)]
        strategy: Option<ConflictStrategy>,
    },
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

#[allow(clippy::unnecessary_wraps)]
fn parse_strategy(s: &str) -> Result<ConflictStrategy, String> {
    Ok(ConflictStrategy::from_name(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cli_default_output_is_unset() {
        let cli = Cli::try_parse_from(["todosync", "status"]).unwrap();
        assert!(cli.output.is_none());
        assert!(!cli.verbose);
        assert!(!cli.offline);
    }

    #[test]
    fn test_cli_output_format_short() {
        let cli = Cli::try_parse_from(["todosync", "-o", "json", "status"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["todosync", "run", "--offline", "-v"]).unwrap();
        assert!(cli.offline);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Run { passes: 1 }));
    }

    #[test]
    fn test_cli_enqueue() {
        let cli = Cli::try_parse_from([
            "todosync",
            "enqueue",
            "update",
            "project",
            "p1",
            "--data",
            r#"{"name":"Home"}"#,
        ])
        .unwrap();

        match cli.command {
            Commands::Enqueue(args) => {
                assert_eq!(args.kind, OperationKind::Update);
                assert_eq!(args.entity_type, EntityType::Project);
                assert_eq!(args.entity_id, "p1");
                assert_eq!(args.data, Some(json!({"name": "Home"})));
            }
            _ => panic!("Expected Enqueue command"),
        }
    }

    #[test]
    fn test_cli_enqueue_rejects_unknown_kind() {
        assert!(Cli::try_parse_from(["todosync", "enqueue", "upsert", "task", "t1"]).is_err());
    }

    #[test]
    fn test_cli_rejects_invalid_json() {
        let result = Cli::try_parse_from([
            "todosync", "conflict", "detect", "--local", "{", "--remote", "1", "--base", "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_conflict_resolve_strategy() {
        let cli = Cli::try_parse_from([
            "todosync",
            "conflict",
            "resolve",
            "--local",
            r#"{"title":"A"}"#,
            "--remote",
            r#"{"title":"B"}"#,
            "--strategy",
            "server-wins",
        ])
        .unwrap();

        match cli.command {
            Commands::Conflict(args) => match args.command {
                ConflictCommands::Resolve {
                    strategy,
                    field_type,
                    entity_type,
                    ..
                } => {
                    assert_eq!(strategy, Some(ConflictStrategy::ServerWins));
                    assert!(field_type.is_none());
                    assert_eq!(entity_type, EntityType::Task);
                }
                _ => panic!("Expected Resolve command"),
            },
            _ => panic!("Expected Conflict command"),
        }
    }

    #[test]
    fn test_cli_unknown_strategy_falls_back_to_last_write_wins() {
        let cli = Cli::try_parse_from([
            "todosync", "conflict", "reconcile", "--local", "1", "--remote", "2", "--base", "0",
            "--strategy", "newest",
        ])
        .unwrap();

        match cli.command {
            Commands::Conflict(args) => match args.command {
                ConflictCommands::Reconcile { strategy, .. } => {
                    assert_eq!(strategy, Some(ConflictStrategy::LastWriteWins));
                }
                _ => panic!("Expected Reconcile command"),
            },
            _ => panic!("Expected Conflict command"),
        }
    }

    #[test]
    fn test_cli_strategy_and_field_type_conflict() {
        let result = Cli::try_parse_from([
            "todosync", "conflict", "resolve", "--local", "[]", "--remote", "[]", "--strategy",
            "manual", "--field-type", "array",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_completions() {
        let cli = Cli::try_parse_from(["todosync", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Completions { shell: Shell::Bash }
        ));
    }
}
