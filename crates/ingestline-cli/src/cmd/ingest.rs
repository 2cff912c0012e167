//! Ingest subcommand - batch a CSV file into the bulk API

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use ingestline_bulk::{
    Batcher, EventSink, IngestConfig, IngestEvent, Ingestor, LogSink, RecordKind, RunTally,
    load_records,
};
use ingestline_core::{HttpTransport, SharedProgress, fmt_num};

use crate::EXIT_CONFIG;
use crate::config::{Config, Kind};

/// Exit code when requests were made but no response ever came back
const EXIT_UNREACHABLE: u8 = 1;
/// Exit code after a shutdown signal (128 + SIGINT)
const EXIT_CANCELLED: u8 = 130;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// CSV file to ingest (default: data.csv)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Which endpoint the records go to
    #[arg(short, long, value_enum)]
    pub kind: Option<Kind>,

    /// Records per request
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Maximum requests per minute
    #[arg(short, long)]
    pub rate_limit: Option<u32>,

    /// Override the endpoint URL for the selected kind
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Retries per batch before it is abandoned
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Retry transient failures without limit
    #[arg(long, conflicts_with = "max_retries")]
    pub retry_forever: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Load and batch the file without sending anything
    #[arg(long)]
    pub dry_run: bool,
}

impl IngestArgs {
    /// Layer command-line overrides over the file configuration.
    fn apply(&self, mut config: IngestConfig) -> IngestConfig {
        if let Some(file) = &self.file {
            config.file_path = file.clone();
        }
        if let Some(kind) = self.kind {
            config.kind = kind.into();
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        if let Some(rate) = self.rate_limit {
            config.rate_limit_per_minute = rate;
        }
        if let Some(url) = &self.endpoint {
            match config.kind {
                RecordKind::Customer => config.endpoints.customer = url.clone(),
                RecordKind::Transaction => config.endpoints.transaction = url.clone(),
            }
        }
        if let Some(n) = self.max_retries {
            config.retry.max_retries = Some(n);
        }
        if self.retry_forever {
            config.retry.max_retries = None;
        }
        config
    }
}

pub fn run(args: IngestArgs, config: &Config, progress: &SharedProgress) -> ExitCode {
    match execute(&args, config, progress) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}

fn execute(args: &IngestArgs, config: &Config, progress: &SharedProgress) -> Result<u8> {
    let ingest = args.apply(config.ingest_config());
    ingest.validate().context("Invalid configuration")?;

    if args.dry_run {
        dry_run(&ingest, &LogSink)?;
        return Ok(0);
    }

    let cancel = ingestline_core::shutdown_flag();
    ingestline_core::install_signal_handlers(&cancel)
        .context("Failed to install signal handlers")?;

    let timeout = Duration::from_secs(args.timeout.unwrap_or(config.http.timeout_secs));
    let kind = ingest.kind;
    log::info!(
        "Ingesting {} as {kind} records: batch size {}, {}/min, retries {}",
        ingest.file_path.display(),
        ingest.batch_size,
        ingest.rate_limit_per_minute,
        ingest
            .retry
            .max_retries
            .map_or("unbounded".to_string(), |n| n.to_string()),
    );

    let mut ingestor = Ingestor::new(&ingest, HttpTransport::new(timeout))?
        .with_cancel(cancel)
        .with_progress(progress.batch_bar(kind.as_str(), 0));
    let tally = ingestor
        .run_file(&ingest.file_path)
        .context("Cannot read input file")?;

    if progress.is_tty() {
        tally.print(kind.as_str());
    } else {
        tally.log();
    }
    Ok(exit_code(&tally))
}

fn exit_code(tally: &RunTally) -> u8 {
    if tally.cancelled {
        EXIT_CANCELLED
    } else if tally.endpoint_unreachable() {
        log::error!("Endpoint never responded ({} attempts)", tally.attempts);
        EXIT_UNREACHABLE
    } else {
        0
    }
}

/// Report the batch plan for `config` without submitting. A missing file
/// is reported the same way a real run reports it.
fn dry_run(config: &IngestConfig, events: &dyn EventSink) -> Result<()> {
    let records = match load_records(&config.file_path) {
        Ok(records) => records,
        Err(e) if e.is_not_found() => {
            events.emit(&IngestEvent::SourceMissing {
                path: &config.file_path,
            });
            Vec::new()
        }
        Err(e) => return Err(e).context("Cannot read input file"),
    };
    let batcher = Batcher::new(config.batch_size)?;

    let mut largest = 0;
    for batch in batcher.batches(&records) {
        let body = batch
            .to_json()
            .with_context(|| format!("Cannot encode batch {}", batch.index + 1))?;
        largest = largest.max(body.len());
    }

    let batches = batcher.batch_count(records.len());
    let interval = 60.0 / f64::from(config.rate_limit_per_minute);
    log::info!(
        "Dry run: {} records in {} batches → {}",
        fmt_num(records.len()),
        fmt_num(batches),
        config.endpoint()
    );
    log::info!(
        "Largest request body {} bytes, minimum run time {:.1}s",
        fmt_num(largest),
        interval * batches as f64
    );
    Ok(())
}
