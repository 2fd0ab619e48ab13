//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod check;
mod migrate;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "march")]
#[command(about = "URL archiver with pluggable capture agents and content deduplication")]
#[command(version)]
pub struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, short = 'c', global = true, env = "MARCH_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run migrations and start the HTTP server
    Serve {
        /// Address to listen on: port, host, or host:port (overrides config)
        #[arg(long, short = 'b', env = "MARCH_BIND")]
        bind: Option<String>,
    },

    /// Apply pending database migrations
    Migrate,

    /// Validate the configuration and show archives and capture agents
    Check,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .ok_or_else(|| anyhow::anyhow!("No config file given (use --config or MARCH_CONFIG)"))?;
    let settings = load_settings(&config_path).await?;

    match cli.command {
        Commands::Serve { bind } => serve::cmd_serve(&settings, bind.as_deref()).await,
        Commands::Migrate => migrate::cmd_migrate(&settings).await,
        Commands::Check => check::cmd_check(&settings, &config_path),
    }
}
