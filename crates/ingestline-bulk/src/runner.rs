//! Ingestion loop: batch → submit (with retries) → pace, one batch at a time

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use indicatif::ProgressBar;
use ingestline_core::{Delay, ThreadDelay, Transport};

use crate::batcher::Batcher;
use crate::config::IngestConfig;
use crate::controller::{Abandon, Resolution, RetryContext, RetryController};
use crate::error::{ConfigError, SourceError};
use crate::events::{EventSink, IngestEvent, LogSink};
use crate::pacer::Pacer;
use crate::record::{Record, load_records};
use crate::stats::RunTally;
use crate::submitter::Submitter;

/// Sequential ingestion of one record stream into one endpoint.
///
/// Per-batch failures never abort a run; they end up in the [`RunTally`].
pub struct Ingestor<T, D = ThreadDelay, E = LogSink> {
    batcher: Batcher,
    pacer: Pacer,
    submitter: Submitter<T>,
    controller: RetryController,
    delay: D,
    events: E,
    cancel: Arc<AtomicBool>,
    progress: ProgressBar,
}

impl<T: Transport> Ingestor<T> {
    /// Validate `config` and build an ingestor with wall-clock delays and
    /// log output. Fails on any configuration error.
    pub fn new(config: &IngestConfig, transport: T) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            batcher: Batcher::new(config.batch_size)?,
            pacer: Pacer::new(config.rate_limit_per_minute)?,
            submitter: Submitter::new(transport, config.endpoint()),
            controller: RetryController::new(config.retry.clone()),
            delay: ThreadDelay,
            events: LogSink,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: ProgressBar::hidden(),
        })
    }
}

impl<T: Transport, D: Delay, E: EventSink> Ingestor<T, D, E> {
    pub fn with_delay<D2: Delay>(self, delay: D2) -> Ingestor<T, D2, E> {
        Ingestor {
            batcher: self.batcher,
            pacer: self.pacer,
            submitter: self.submitter,
            controller: self.controller,
            delay,
            events: self.events,
            cancel: self.cancel,
            progress: self.progress,
        }
    }

    pub fn with_events<E2: EventSink>(self, events: E2) -> Ingestor<T, D, E2> {
        Ingestor {
            batcher: self.batcher,
            pacer: self.pacer,
            submitter: self.submitter,
            controller: self.controller,
            delay: self.delay,
            events,
            cancel: self.cancel,
            progress: self.progress,
        }
    }

    /// Stop between batches and between retries once `flag` is set.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = flag;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Reproducible retry jitter.
    pub fn with_seed(mut self, seed: u64) -> Self {
        let policy = self.controller.policy().clone();
        self.controller = RetryController::seeded(policy, seed);
        self
    }

    /// Load `path` and ingest it. A missing file is logged and ingested as
    /// zero records; any other read failure is returned.
    pub fn run_file(&mut self, path: &Path) -> Result<RunTally, SourceError> {
        let records = match load_records(path) {
            Ok(records) => records,
            Err(e) if e.is_not_found() => {
                self.events.emit(&IngestEvent::SourceMissing { path });
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        Ok(self.run(&records))
    }

    /// Ingest `records` in order, one batch at a time.
    pub fn run(&mut self, records: &[Record]) -> RunTally {
        let start = Instant::now();
        let mut tally = RunTally {
            total_records: records.len() as u64,
            batches_total: self.batcher.batch_count(records.len()),
            ..RunTally::default()
        };
        self.events.emit(&IngestEvent::RecordsLoaded {
            total: records.len(),
            batches: tally.batches_total,
            endpoint: self.submitter.endpoint(),
        });
        self.progress.set_length(tally.batches_total as u64);

        for batch in self.batcher.batches(records) {
            if self.cancel.load(Ordering::Relaxed) {
                tally.cancelled = true;
                self.events.emit(&IngestEvent::Cancelled { batch: batch.index });
                break;
            }

            let ctx = RetryContext {
                delay: &self.delay,
                events: &self.events,
                cancel: &self.cancel,
                progress: &self.progress,
            };
            let submitter = &self.submitter;
            let result = self
                .controller
                .resolve(&batch, |b| submitter.submit(b), &ctx);

            tally.attempts += u64::from(result.attempts);
            tally.retries += u64::from(result.retries);
            tally.endpoint_reached |= result.responded;

            match result.resolution {
                Resolution::Delivered {
                    success_count,
                    failed_count,
                } => {
                    tally.batches_delivered += 1;
                    tally.successful_records += success_count;
                    tally.failed_records += failed_count;
                    self.events.emit(&IngestEvent::BatchDelivered {
                        batch: batch.index,
                        records: batch.len(),
                        success_count,
                        failed_count,
                    });
                }
                Resolution::Abandoned(cause) => {
                    tally.batches_abandoned += 1;
                    match cause {
                        Abandon::Rejected { .. } => tally.rejected_records += batch.len() as u64,
                        Abandon::Exhausted { .. } => tally.failed_records += batch.len() as u64,
                    }
                    self.events.emit(&IngestEvent::BatchAbandoned {
                        batch: batch.index,
                        records: batch.len(),
                        cause: &cause,
                    });
                }
                Resolution::Cancelled => {
                    tally.cancelled = true;
                    self.events.emit(&IngestEvent::Cancelled { batch: batch.index });
                    break;
                }
            }

            self.progress.inc(1);
            self.progress.set_message("");
            self.pacer.wait_slot(&self.delay);
        }

        self.progress.finish_and_clear();
        tally.elapsed = start.elapsed();
        self.events.emit(&IngestEvent::Completed { tally: &tally });
        tally
    }
}
