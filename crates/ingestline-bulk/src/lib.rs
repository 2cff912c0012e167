//! Ingestline Bulk - rate-limited batch ingestion into a bulk HTTP API
//!
//! Reads tabular records, splits them into fixed-size batches and submits
//! them one at a time, retrying transient failures and pacing requests to a
//! calls-per-minute budget.
//!
//! # Example
//!
//! ```ignore
//! use ingestline_bulk::{IngestConfig, Ingestor};
//! use ingestline_core::HttpTransport;
//!
//! let config = IngestConfig {
//!     batch_size: 50,
//!     ..Default::default()
//! };
//! let mut ingestor = Ingestor::new(&config, HttpTransport::default())?;
//! let tally = ingestor.run_file(&config.file_path)?;
//! println!("{} records delivered", tally.successful_records);
//! ```

pub mod batcher;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod pacer;
pub mod record;
pub mod runner;
pub mod stats;
pub mod submitter;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use batcher::{Batch, Batcher};
pub use config::{Endpoints, IngestConfig, RecordKind};
pub use controller::{Abandon, Resolution, RetryController, RetryPolicy};
pub use error::{ConfigError, SourceError};
pub use events::{EventSink, IngestEvent, LogSink};
pub use pacer::Pacer;
pub use record::{Record, load_records, read_records};
pub use runner::Ingestor;
pub use stats::RunTally;
pub use submitter::{RetryReason, SubmissionOutcome, Submitter, classify};
