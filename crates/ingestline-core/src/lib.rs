//! Ingestline Core - shared infrastructure for bulk ingestion jobs
//!
//! HTTP transport behind a blocking interface, backoff arithmetic,
//! the injectable delay capability, cancellation, logging and progress.

pub mod delay;
pub mod http;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod shutdown;

// Re-exports for convenience
pub use delay::{Delay, ThreadDelay};
pub use http::{
    DEFAULT_REQUEST_TIMEOUT, HttpTransport, Transport, TransportError, TransportResponse,
};
pub use logging::{IndicatifLogger, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use retry::{backoff_duration, uniform_between, with_jitter};
pub use shutdown::{install_signal_handlers, shutdown_flag};
