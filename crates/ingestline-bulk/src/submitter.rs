//! One-shot batch submission and outcome classification

use ingestline_core::{Transport, TransportError, TransportResponse};
use serde_json::Value;

use crate::batcher::Batch;

/// Why a submission is worth repeating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryReason {
    /// No HTTP response (connect failure, timeout, DNS, ...)
    Transport,
    /// HTTP 429
    RateLimited,
    /// HTTP 5xx
    ServerError,
}

impl RetryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
        }
    }
}

impl std::fmt::Display for RetryReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized result of one submission attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// `report_error` is set when the 2xx body could not be read as a
    /// count report; the affected counts are then 0.
    Delivered {
        success_count: u64,
        failed_count: u64,
        report_error: Option<String>,
    },
    RetryableFailure {
        reason: RetryReason,
        detail: String,
    },
    /// `status` is `None` only when the batch could not be encoded locally.
    TerminalFailure {
        status: Option<u16>,
        message: String,
    },
}

impl SubmissionOutcome {
    /// Whether the endpoint produced an HTTP response at all.
    pub fn got_response(&self) -> bool {
        match self {
            Self::Delivered { .. } => true,
            Self::RetryableFailure { reason, .. } => *reason != RetryReason::Transport,
            Self::TerminalFailure { status, .. } => status.is_some(),
        }
    }
}

/// Counts reported by the endpoint on success.
#[derive(Debug, Default)]
struct DeliveryReport {
    success_count: u64,
    failed_count: u64,
    error: Option<String>,
}

/// Classify a raw transport result.
pub fn classify(result: Result<TransportResponse, TransportError>) -> SubmissionOutcome {
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            return SubmissionOutcome::RetryableFailure {
                reason: RetryReason::Transport,
                detail: e.message,
            };
        }
    };

    match resp.status {
        200..=299 => {
            let report = parse_report(&resp.body);
            SubmissionOutcome::Delivered {
                success_count: report.success_count,
                failed_count: report.failed_count,
                report_error: report.error,
            }
        }
        429 => SubmissionOutcome::RetryableFailure {
            reason: RetryReason::RateLimited,
            detail: format!("HTTP 429: {}", resp.body),
        },
        500..=u16::MAX => SubmissionOutcome::RetryableFailure {
            reason: RetryReason::ServerError,
            detail: format!("HTTP {}: {}", resp.status, resp.body),
        },
        status => SubmissionOutcome::TerminalFailure {
            status: Some(status),
            message: resp.body,
        },
    }
}

/// Each count is read on its own: absent or `null` is 0, anything else that
/// is not a non-negative integer is 0 and reported. Empty bodies are 0/0;
/// non-JSON bodies are 0/0 and reported. The batch was accepted either way.
fn parse_report(body: &str) -> DeliveryReport {
    if body.trim().is_empty() {
        return DeliveryReport::default();
    }
    let value = match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(e) => {
            return DeliveryReport {
                error: Some(format!("body is not JSON: {e}")),
                ..DeliveryReport::default()
            };
        }
    };
    let Some(object) = value.as_object() else {
        return DeliveryReport {
            error: Some("body is not a JSON object".to_string()),
            ..DeliveryReport::default()
        };
    };

    let mut problems = Vec::new();
    let mut count = |field: &str| match object.get(field) {
        None | Some(Value::Null) => 0,
        Some(v) => v.as_u64().unwrap_or_else(|| {
            problems.push(format!("{field} is not a count: {v}"));
            0
        }),
    };
    let success_count = count("success_count");
    let failed_count = count("failed_count");
    DeliveryReport {
        success_count,
        failed_count,
        error: (!problems.is_empty()).then(|| problems.join(", ")),
    }
}

/// Sends batches to one endpoint through a [`Transport`].
///
/// Performs exactly one request per call; retrying is the caller's job.
pub struct Submitter<T> {
    transport: T,
    endpoint: String,
}

impl<T: Transport> Submitter<T> {
    pub fn new(transport: T, endpoint: impl Into<String>) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn submit(&self, batch: &Batch<'_>) -> SubmissionOutcome {
        let body = match batch.to_json() {
            Ok(body) => body,
            Err(e) => {
                return SubmissionOutcome::TerminalFailure {
                    status: None,
                    message: format!("cannot encode batch: {e}"),
                };
            }
        };
        classify(self.transport.post_json(&self.endpoint, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::Batcher;
    use crate::record::Record;
    use crate::testing::ScriptedTransport;

    fn respond(status: u16, body: &str) -> SubmissionOutcome {
        classify(Ok(TransportResponse::new(status, body)))
    }

    fn delivered(success_count: u64, failed_count: u64) -> SubmissionOutcome {
        SubmissionOutcome::Delivered {
            success_count,
            failed_count,
            report_error: None,
        }
    }

    #[test]
    fn ok_with_counts_is_delivered() {
        assert_eq!(
            respond(200, r#"{"success_count": 7, "failed_count": 1}"#),
            delivered(7, 1)
        );
    }

    #[test]
    fn missing_counts_default_to_zero() {
        assert_eq!(
            respond(201, r#"{"status": "queued", "success_count": 3}"#),
            delivered(3, 0)
        );
        assert_eq!(respond(204, ""), delivered(0, 0));
    }

    #[test]
    fn null_count_keeps_the_other_count() {
        assert_eq!(
            respond(200, r#"{"success_count": 7, "failed_count": null}"#),
            delivered(7, 0)
        );
    }

    #[test]
    fn mistyped_count_is_zero_and_reported() {
        let SubmissionOutcome::Delivered {
            success_count,
            failed_count,
            report_error,
        } = respond(200, r#"{"success_count": 7, "failed_count": "1"}"#)
        else {
            panic!("expected delivery");
        };
        assert_eq!((success_count, failed_count), (7, 0));
        assert_eq!(
            report_error.as_deref(),
            Some(r#"failed_count is not a count: "1""#)
        );
    }

    #[test]
    fn garbage_success_body_is_zero_counts() {
        let SubmissionOutcome::Delivered {
            success_count,
            failed_count,
            report_error,
        } = respond(200, "<html>ok</html>")
        else {
            panic!("expected delivery");
        };
        assert_eq!((success_count, failed_count), (0, 0));
        assert!(report_error.unwrap().starts_with("body is not JSON"));
        assert!(respond(200, "[1, 2]").got_response());
    }

    #[test]
    fn too_many_requests_is_rate_limited() {
        let outcome = respond(429, "slow down");
        assert!(matches!(
            outcome,
            SubmissionOutcome::RetryableFailure {
                reason: RetryReason::RateLimited,
                ..
            }
        ));
        assert!(outcome.got_response());
    }

    #[test]
    fn server_errors_are_retryable() {
        for status in [500, 502, 503, 504, 599] {
            assert!(matches!(
                respond(status, ""),
                SubmissionOutcome::RetryableFailure {
                    reason: RetryReason::ServerError,
                    ..
                }
            ));
        }
    }

    #[test]
    fn client_errors_are_terminal() {
        for status in [301, 400, 401, 403, 404, 422] {
            assert_eq!(
                respond(status, "nope"),
                SubmissionOutcome::TerminalFailure {
                    status: Some(status),
                    message: "nope".to_string()
                }
            );
        }
    }

    #[test]
    fn no_response_is_transport_failure() {
        let outcome = classify(Err(TransportError::new("connect: refused")));
        assert_eq!(
            outcome,
            SubmissionOutcome::RetryableFailure {
                reason: RetryReason::Transport,
                detail: "connect: refused".to_string()
            }
        );
        assert!(!outcome.got_response());
    }

    #[test]
    fn reason_labels() {
        assert_eq!(RetryReason::Transport.to_string(), "transport");
        assert_eq!(RetryReason::RateLimited.to_string(), "rate_limited");
        assert_eq!(RetryReason::ServerError.to_string(), "server_error");
    }

    #[test]
    fn submit_posts_json_array_to_endpoint() {
        let transport = ScriptedTransport::echo_counts();
        let submitter = Submitter::new(&transport, "http://api.test/add_customer");
        let records = vec![
            Record::from_pairs([("id", "1")]),
            Record::from_pairs([("id", "2")]),
        ];
        let batch = Batcher::new(10).unwrap().batches(&records).next().unwrap();

        let outcome = submitter.submit(&batch);

        assert_eq!(outcome, delivered(2, 0));
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://api.test/add_customer");
        let sent: serde_json::Value = serde_json::from_slice(&requests[0].1).unwrap();
        assert_eq!(sent, serde_json::json!([{"id": "1"}, {"id": "2"}]));
    }
}
