//! Error types for the ingestion core

use std::path::PathBuf;

/// Invalid run configuration. Always fatal, raised before any submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    BatchSize(usize),
    RateLimit(u32),
    Endpoint { kind: String, url: String, reason: String },
    Retry(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BatchSize(n) => write!(f, "batch size must be positive (got {n})"),
            Self::RateLimit(n) => {
                write!(f, "rate limit must be at least 1 call per minute (got {n})")
            }
            Self::Endpoint { kind, url, reason } => {
                write!(f, "invalid {kind} endpoint {url:?}: {reason}")
            }
            Self::Retry(msg) => write!(f, "invalid retry policy: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure reading the tabular input file.
///
/// `NotFound` is recovered by the caller (zero records); the rest are fatal.
#[derive(Debug)]
pub enum SourceError {
    NotFound(PathBuf),
    Io { path: PathBuf, source: std::io::Error },
    Csv { path: PathBuf, source: csv::Error },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "file not found: {}", path.display()),
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Csv { path, source } => write!(f, "malformed CSV in {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
        }
    }
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
