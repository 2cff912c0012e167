//! ingestline - push CSV exports into a bulk ingestion API
//!
//! Reads records from a CSV file, posts them in fixed-size batches to the
//! customer or transaction endpoint, and retries and paces requests so the
//! API's rate limit is respected.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

mod cmd;
mod config;

use config::Config;

/// Exit code for bad configuration or an unreadable input file
pub const EXIT_CONFIG: u8 = 2;

#[derive(Parser)]
#[command(name = "ingestline")]
#[command(about = "Rate-limited batch ingestion of CSV records into a bulk HTTP API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "debug")]
    quiet: bool,

    /// Config file path (default: ./ingestline.toml or ~/.config/ingestline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a CSV file into the bulk API
    Ingest(cmd::ingest::IngestArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(ingestline_core::ProgressContext::new());

    // Logging:
    //   TTY:     progress bar above log lines, info unless --quiet/--debug
    //   non-TTY: plain log lines are the only progress indicator
    let multi = progress.is_tty().then(|| progress.multi());
    if let Err(e) = ingestline_core::init_logging(cli.quiet, cli.debug, multi) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let config = match cli.config {
        Some(path) => Config::from_file(&path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e:#}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    match cli.command {
        Command::Ingest(args) => cmd::ingest::run(args, &config, &progress),
        Command::Config => {
            cmd::show::run(&config);
            ExitCode::SUCCESS
        }
    }
}
