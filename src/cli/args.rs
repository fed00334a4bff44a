//! CLI argument definitions using clap derive

use crate::LedgerId;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ledger-index - ledger index file cache for storage nodes
///
/// Creates, inspects and deletes per-ledger index files, and exercises the
/// reference-counted backing cache that shares them between threads.
#[derive(Parser, Debug)]
#[command(name = "ledger-index")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LEDGER_INDEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Ledger index directory (overrides storage.ledger_dir)
    #[arg(long, global = true, env = "LEDGER_INDEX_DIR")]
    pub ledger_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the index file for a ledger
    Create(CreateArgs),

    /// Show the header of an existing ledger index
    Inspect(InspectArgs),

    /// Delete a ledger index so it cannot be reopened
    Delete(DeleteArgs),

    /// Run concurrent load/release cycles against the backing cache
    Stress(StressArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the create command
#[derive(Parser, Debug)]
pub struct CreateArgs {
    /// Ledger id
    pub ledger: LedgerId,

    /// Master key stored in the index header
    #[arg(short, long)]
    pub master_key: String,

    /// Mark the ledger fenced after creating it
    #[arg(long)]
    pub fenced: bool,
}

/// Arguments for the inspect command
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Ledger id
    pub ledger: LedgerId,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Ledger id
    pub ledger: LedgerId,
}

/// Arguments for the stress command
#[derive(Parser, Debug)]
pub struct StressArgs {
    /// Ledger id to load and release
    #[arg(short, long, default_value = "1")]
    pub ledger: LedgerId,

    /// Total load-then-release operations
    #[arg(long, default_value = "500")]
    pub ops: usize,

    /// Concurrent workers
    #[arg(short, long, default_value = "10")]
    pub workers: usize,

    /// Master key used to create the ledger if it does not exist
    #[arg(short, long, default_value = "stress")]
    pub master_key: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., storage.lock_stripes)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Output format for reporting commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_create() {
        let cli = Cli::parse_from(["ledger-index", "create", "42", "--master-key", "secret"]);
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.ledger, 42);
                assert_eq!(args.master_key, "secret");
                assert!(!args.fenced);
            }
            _ => panic!("expected Create command"),
        }
    }

    #[test]
    fn cli_parses_stress_defaults() {
        let cli = Cli::parse_from(["ledger-index", "stress"]);
        match cli.command {
            Commands::Stress(args) => {
                assert_eq!(args.ledger, 1);
                assert_eq!(args.ops, 500);
                assert_eq!(args.workers, 10);
                assert_eq!(args.format, OutputFormat::Text);
            }
            _ => panic!("expected Stress command"),
        }
    }

    #[test]
    fn cli_parses_inspect_json() {
        let cli = Cli::parse_from(["ledger-index", "inspect", "7", "--format", "json"]);
        match cli.command {
            Commands::Inspect(args) => {
                assert_eq!(args.ledger, 7);
                assert_eq!(args.format, OutputFormat::Json);
            }
            _ => panic!("expected Inspect command"),
        }
    }

    #[test]
    fn cli_rejects_negative_ledger() {
        assert!(Cli::try_parse_from(["ledger-index", "delete", "-3"]).is_err());
    }

    #[test]
    fn cli_global_ledger_dir() {
        let cli = Cli::parse_from(["ledger-index", "--ledger-dir", "/tmp/l", "delete", "3"]);
        assert_eq!(cli.ledger_dir, Some(PathBuf::from("/tmp/l")));
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["ledger-index", "config"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["ledger-index", "-vv", "config"]);
        assert_eq!(cli.verbose, 2);
    }
}
