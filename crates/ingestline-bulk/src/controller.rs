//! Retry controller: drives attempts for one batch until it resolves.
//!
//! Per batch the state runs `Pending → Attempting → {Delivered, Abandoned}`:
//!
//! - `Delivered`: counts are returned as-is, even when the endpoint reports
//!   some records as failed.
//! - `TerminalFailure`: abandoned immediately, never re-sent.
//! - `RetryableFailure`: wait, then re-send the identical batch. Rate-limited
//!   attempts wait a uniform delay inside the rate-limit window; server and
//!   transport failures back off exponentially with jitter up to a cap.
//!
//! Every retry counts toward [`RetryPolicy::max_retries`]; `None` retries
//! forever. The cancel flag is checked before and after each backoff sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::ProgressBar;
use ingestline_core::{Delay, backoff_duration, uniform_between, with_jitter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::batcher::Batch;
use crate::error::ConfigError;
use crate::events::{EventSink, IngestEvent};
use crate::submitter::{RetryReason, SubmissionOutcome};

/// Retry ceiling and backoff shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt; `None` = unbounded.
    pub max_retries: Option<u32>,
    /// First server/transport backoff; doubles per retry.
    pub base_delay: Duration,
    /// Ceiling for server/transport backoff.
    pub max_delay: Duration,
    pub rate_limit_min: Duration,
    pub rate_limit_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Some(5),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            rate_limit_min: Duration::from_secs(1),
            rate_limit_max: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Default delays with no retry ceiling.
    pub fn unbounded() -> Self {
        Self {
            max_retries: None,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay > self.max_delay {
            return Err(ConfigError::Retry(format!(
                "base delay {:?} exceeds max delay {:?}",
                self.base_delay, self.max_delay
            )));
        }
        if self.rate_limit_min > self.rate_limit_max {
            return Err(ConfigError::Retry(format!(
                "rate-limit window is inverted ({:?} > {:?})",
                self.rate_limit_min, self.rate_limit_max
            )));
        }
        Ok(())
    }

    /// Whether another retry is allowed after `retries_done`.
    pub fn allows_retry(&self, retries_done: u32) -> bool {
        self.max_retries.map_or(true, |max| retries_done < max)
    }
}

/// Why a batch was given up on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Abandon {
    /// Non-retryable response; the records are skipped.
    Rejected { status: Option<u16>, message: String },
    /// Retry ceiling reached; the records count as failed.
    Exhausted {
        retries: u32,
        reason: RetryReason,
        detail: String,
    },
}

impl std::fmt::Display for Abandon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rejected {
                status: Some(s),
                message,
            } => write!(f, "rejected with HTTP {s}: {message}"),
            Self::Rejected {
                status: None,
                message,
            } => write!(f, "rejected: {message}"),
            Self::Exhausted {
                retries,
                reason,
                detail,
            } => write!(f, "gave up after {retries} retries ({reason}: {detail})"),
        }
    }
}

/// Terminal state of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Delivered {
        success_count: u64,
        failed_count: u64,
    },
    Abandoned(Abandon),
    /// Cancel flag was raised while the batch was still retrying.
    Cancelled,
}

/// Resolution plus what it took to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    pub resolution: Resolution,
    pub attempts: u32,
    pub retries: u32,
    /// At least one attempt got an HTTP response.
    pub responded: bool,
}

/// Capabilities the controller blocks, reports and checks through.
pub struct RetryContext<'a> {
    pub delay: &'a dyn Delay,
    pub events: &'a dyn EventSink,
    pub cancel: &'a AtomicBool,
    pub progress: &'a ProgressBar,
}

/// Drives attempts for one batch at a time.
pub struct RetryController<R = StdRng> {
    policy: RetryPolicy,
    rng: R,
}

impl RetryController<StdRng> {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_rng(policy, StdRng::from_entropy())
    }

    /// Deterministic jitter, for tests and reproducible runs.
    pub fn seeded(policy: RetryPolicy, seed: u64) -> Self {
        Self::with_rng(policy, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RetryController<R> {
    pub fn with_rng(policy: RetryPolicy, rng: R) -> Self {
        Self { policy, rng }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Wait before retry number `retry` (1-based).
    pub fn backoff(&mut self, reason: RetryReason, retry: u32) -> Duration {
        match reason {
            RetryReason::RateLimited => uniform_between(
                self.policy.rate_limit_min,
                self.policy.rate_limit_max,
                &mut self.rng,
            ),
            RetryReason::ServerError | RetryReason::Transport => {
                let capped = backoff_duration(self.policy.base_delay, self.policy.max_delay, retry);
                with_jitter(capped, &mut self.rng)
            }
        }
    }

    /// Submit `batch` until it is delivered, abandoned or cancelled.
    pub fn resolve(
        &mut self,
        batch: &Batch<'_>,
        mut submit: impl FnMut(&Batch<'_>) -> SubmissionOutcome,
        ctx: &RetryContext<'_>,
    ) -> BatchResult {
        let mut attempts = 0u32;
        let mut retries = 0u32;
        let mut responded = false;

        let resolution = loop {
            attempts += 1;
            let outcome = submit(batch);
            responded |= outcome.got_response();

            let (reason, detail) = match outcome {
                SubmissionOutcome::Delivered {
                    success_count,
                    failed_count,
                    report_error,
                } => {
                    if let Some(problem) = &report_error {
                        ctx.events.emit(&IngestEvent::UnreadableReport {
                            batch: batch.index,
                            problem,
                        });
                    }
                    break Resolution::Delivered {
                        success_count,
                        failed_count,
                    };
                }
                SubmissionOutcome::TerminalFailure { status, message } => {
                    break Resolution::Abandoned(Abandon::Rejected { status, message });
                }
                SubmissionOutcome::RetryableFailure { reason, detail } => (reason, detail),
            };

            if !self.policy.allows_retry(retries) {
                break Resolution::Abandoned(Abandon::Exhausted {
                    retries,
                    reason,
                    detail,
                });
            }
            if ctx.cancel.load(Ordering::Relaxed) {
                break Resolution::Cancelled;
            }

            retries += 1;
            let wait = self.backoff(reason, retries);
            ctx.events.emit(&IngestEvent::RetryScheduled {
                batch: batch.index,
                retry: retries,
                max_retries: self.policy.max_retries,
                reason,
                detail: &detail,
                delay: wait,
            });
            ctx.progress
                .set_message(format!("batch {}: {reason}, retry {retries}", batch.index + 1));
            ctx.delay.delay(wait);

            if ctx.cancel.load(Ordering::Relaxed) {
                break Resolution::Cancelled;
            }
        };

        BatchResult {
            resolution,
            attempts,
            retries,
            responded,
        }
    }
}
