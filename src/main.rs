//! ledger-index - ledger index file cache for storage nodes
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use ledger_index::cli::{Cli, Commands};
use ledger_index::config::ConfigManager;
use ledger_index::error::LedgerResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> LedgerResult<()> {
    let cli = Cli::parse();

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };

    let mut config = config_manager.load().await?;
    if let Some(dir) = cli.ledger_dir.clone() {
        config.storage.ledger_dir = dir;
    }

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("ledger_index=warn"),
        1 => EnvFilter::new("ledger_index=info"),
        _ => EnvFilter::new("ledger_index=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    match cli.command {
        Commands::Create(args) => ledger_index::cli::commands::create(args, &config).await,
        Commands::Inspect(args) => ledger_index::cli::commands::inspect(args, &config).await,
        Commands::Delete(args) => ledger_index::cli::commands::delete(args, &config).await,
        Commands::Stress(args) => ledger_index::cli::commands::stress(args, &config).await,
        Commands::Config(args) => {
            ledger_index::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
