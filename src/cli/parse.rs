//! CLI parse: clap types for provebit. No behavior; definitions only.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Provebit CLI - periodic proof-of-existence for tracked files
#[derive(Parser)]
#[command(name = "provebit")]
#[command(about = "Periodic proof-of-existence for tracked files using Merkle trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (where provebit.toml is looked up)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build one tree over the given paths and print its root
    Prove {
        /// Files or directories to include
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Descend into nested directories
        #[arg(short, long)]
        recursive: bool,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Run the rebuild daemon over the given paths for a number of ticks
    Run {
        /// Files or directories to track
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Descend into nested directories
        #[arg(short, long)]
        recursive: bool,
        /// Seconds between rebuilds (default: daemon.default_period_secs)
        #[arg(long)]
        period: Option<u64>,
        /// Milliseconds between rebuilds; takes precedence over --period
        #[arg(long, hide = true)]
        interval_ms: Option<u64>,
        /// Completed rebuilds to wait for before stopping
        #[arg(long, default_value = "1")]
        ticks: u64,
    },
    /// Line-based command loop on stdin
    Shell,
    /// Print the effective configuration
    Config,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Prove { .. } => "prove",
            Commands::Run { .. } => "run",
            Commands::Shell => "shell",
            Commands::Config => "config",
        }
    }
}
