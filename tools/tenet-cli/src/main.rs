//! Tenet CLI: record a clip and write it forward and reversed.
//!
//! Usage:
//!   tenet [OPTIONS]            Record with the configured defaults
//!   tenet record [OPTIONS]     Same as above
//!   tenet check                Check system capabilities

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tenet_common::config::AppConfig;

mod commands;

#[derive(Parser)]
#[command(
    name = "tenet",
    about = "Record from the camera and save the clip forward and reversed",
    version,
    author,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    record: RecordArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a clip (the default)
    Record(RecordArgs),

    /// Check system capabilities
    Check,
}

/// Overrides for the configured recording parameters.
#[derive(Args, Debug, Clone, Default)]
pub struct RecordArgs {
    /// Capture length in seconds
    #[arg(short, long)]
    pub duration: Option<f64>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Zero-based camera index
    #[arg(long)]
    pub device: Option<u32>,

    /// Frame rate written into the output files
    #[arg(long)]
    pub fps: Option<u32>,

    /// Seconds to wait before capture starts
    #[arg(long)]
    pub countdown: Option<u64>,

    /// Record without preview windows
    #[arg(long)]
    pub no_preview: bool,

    /// Use a generated test pattern instead of a camera
    #[arg(long)]
    pub synthetic: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    tenet_common::logging::init_logging(&config.logging);

    match cli.command.unwrap_or(Commands::Record(cli.record)) {
        Commands::Record(args) => commands::record::run(config, args),
        Commands::Check => commands::check::run(&config),
    }
}
