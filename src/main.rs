use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use todosync::cli::args::{Cli, Commands};
use todosync::cli::commands::{self, Context};
use todosync::config::ColorSetting;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "todosync=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn apply_color(setting: ColorSetting) {
    match setting {
        ColorSetting::Auto => {}
        ColorSetting::Always => colored::control::set_override(true),
        ColorSetting::Never => colored::control::set_override(false),
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Completions don't need the data directory
    if let Commands::Completions { shell } = cli.command {
        print!("{}", commands::completions(shell));
        return Ok(());
    }

    let ctx = Context::load(cli.output, cli.offline)?;
    apply_color(ctx.config.general.color);

    let output = match cli.command {
        Commands::Status => commands::status(&ctx)?,
        Commands::Enqueue(args) => commands::enqueue(&ctx, args)?,
        Commands::List { limit } => commands::list(&ctx, limit)?,
        Commands::Run { passes } => commands::run(&ctx, passes).await?,
        Commands::Clear { older_than } => commands::clear(&ctx, older_than)?,
        Commands::Conflict(args) => commands::conflict(&ctx, args.command)?,
        Commands::Completions { .. } => String::new(),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
