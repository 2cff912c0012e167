//! Typed run events and the sink they are emitted into.
//!
//! The ingestion loop reports everything an operator should see through an
//! [`EventSink`]. [`LogSink`] forwards to the `log` facade; tests swap in a
//! recording sink.

use std::path::Path;
use std::time::Duration;

use crate::controller::Abandon;
use crate::stats::RunTally;
use crate::submitter::RetryReason;

/// Something that happened during a run. Batch numbers are 0-based.
#[derive(Debug)]
pub enum IngestEvent<'a> {
    SourceMissing {
        path: &'a Path,
    },
    RecordsLoaded {
        total: usize,
        batches: usize,
        endpoint: &'a str,
    },
    RetryScheduled {
        batch: usize,
        retry: u32,
        max_retries: Option<u32>,
        reason: RetryReason,
        detail: &'a str,
        delay: Duration,
    },
    /// Accepted with a 2xx whose counts could not be read.
    UnreadableReport {
        batch: usize,
        problem: &'a str,
    },
    BatchDelivered {
        batch: usize,
        records: usize,
        success_count: u64,
        failed_count: u64,
    },
    BatchAbandoned {
        batch: usize,
        records: usize,
        cause: &'a Abandon,
    },
    Cancelled {
        batch: usize,
    },
    Completed {
        tally: &'a RunTally,
    },
}

impl IngestEvent<'_> {
    pub fn level(&self) -> log::Level {
        match self {
            Self::SourceMissing { .. } | Self::BatchAbandoned { .. } => log::Level::Error,
            Self::RetryScheduled { .. }
            | Self::UnreadableReport { .. }
            | Self::Cancelled { .. } => log::Level::Warn,
            Self::BatchDelivered { .. } => log::Level::Debug,
            Self::RecordsLoaded { .. } | Self::Completed { .. } => log::Level::Info,
        }
    }
}

impl std::fmt::Display for IngestEvent<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceMissing { path } => {
                write!(f, "file not found: {}, nothing to ingest", path.display())
            }
            Self::RecordsLoaded {
                total,
                batches,
                endpoint,
            } => write!(
                f,
                "Total records to ingest: {total} ({batches} batches → {endpoint})"
            ),
            Self::RetryScheduled {
                batch,
                retry,
                max_retries,
                reason,
                detail,
                delay,
            } => {
                let limit = max_retries.map_or("∞".to_string(), |m| m.to_string());
                write!(
                    f,
                    "batch {}: {reason} ({detail}), retry {retry}/{limit} in {:.1}s",
                    batch + 1,
                    delay.as_secs_f64()
                )
            }
            Self::UnreadableReport { batch, problem } => write!(
                f,
                "batch {}: accepted, but counting 0 for unreadable report ({problem})",
                batch + 1
            ),
            Self::BatchDelivered {
                batch,
                records,
                success_count,
                failed_count,
            } => write!(
                f,
                "batch {}: {records} records sent, {success_count} succeeded, {failed_count} failed",
                batch + 1
            ),
            Self::BatchAbandoned {
                batch,
                records,
                cause,
            } => write!(f, "batch {} ({records} records) abandoned: {cause}", batch + 1),
            Self::Cancelled { batch } => {
                write!(f, "shutdown requested, stopping at batch {}", batch + 1)
            }
            Self::Completed { tally } => write!(
                f,
                "Ingestion completed: {} successful, {} failed records",
                tally.successful_records, tally.failed_records
            ),
        }
    }
}

/// Receiver of run events.
pub trait EventSink {
    fn emit(&self, event: &IngestEvent<'_>);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: &IngestEvent<'_>) {
        (**self).emit(event);
    }
}

/// Forwards events to the `log` facade at their own level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &IngestEvent<'_>) {
        log::log!(event.level(), "{event}");
    }
}
