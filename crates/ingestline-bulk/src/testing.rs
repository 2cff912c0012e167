//! Fakes for the injected capabilities (test builds only)

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use ingestline_core::{Delay, Transport, TransportError, TransportResponse};

use crate::events::{EventSink, IngestEvent};

/// One canned transport answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    /// 200 with `success_count` = number of records in the request
    EchoCounts,
    /// No response at all
    Fail(String),
}

impl Reply {
    pub fn status(code: u16, body: &str) -> Self {
        Self::Status(code, body.to_string())
    }

    fn answer(&self, body: &[u8]) -> Result<TransportResponse, TransportError> {
        match self {
            Self::Status(code, text) => Ok(TransportResponse::new(*code, text.clone())),
            Self::EchoCounts => {
                let sent: Vec<serde_json::Value> =
                    serde_json::from_slice(body).expect("request body is a JSON array");
                let reply = serde_json::json!({"success_count": sent.len(), "failed_count": 0});
                Ok(TransportResponse::new(200, reply.to_string()))
            }
            Self::Fail(msg) => Err(TransportError::new(msg.clone())),
        }
    }
}

/// Answers from a script, then repeats `fallback` forever.
/// Records every (url, body) it was sent.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    requests: Mutex<Vec<(String, Vec<u8>)>>,
}

impl ScriptedTransport {
    pub fn scripted(script: impl IntoIterator<Item = Reply>, fallback: Reply) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn echo_counts() -> Self {
        Self::scripted(Vec::<Reply>::new(), Reply::EchoCounts)
    }

    pub fn always(status: u16, body: &str) -> Self {
        Self::scripted(Vec::<Reply>::new(), Reply::status(status, body))
    }

    pub fn requests(&self) -> Vec<(String, Vec<u8>)> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn post_json(&self, url: &str, body: Vec<u8>) -> Result<TransportResponse, TransportError> {
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let result = reply.answer(&body);
        self.requests.lock().unwrap().push((url.to_string(), body));
        result
    }
}

/// Records requested delays without sleeping.
#[derive(Default)]
pub struct RecordingDelay {
    calls: Mutex<Vec<Duration>>,
}

impl RecordingDelay {
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().clone()
    }
}

impl Delay for RecordingDelay {
    fn delay(&self, duration: Duration) {
        self.calls.lock().unwrap().push(duration);
    }
}

/// Captures rendered events with their level.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(log::Level, String)>>,
}

impl RecordingSink {
    pub fn messages(&self, level: log::Level) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self, level: log::Level) -> usize {
        self.messages(level).len()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &IngestEvent<'_>) {
        self.events
            .lock()
            .unwrap()
            .push((event.level(), event.to_string()));
    }
}
