//! Ingestion run configuration

use std::path::PathBuf;

use crate::controller::RetryPolicy;
use crate::error::ConfigError;

pub const DEFAULT_FILE_PATH: &str = "data.csv";
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 1000;
pub const DEFAULT_CUSTOMER_URL: &str = "https://pac.intouch.capillarytech.com/add_customer";
pub const DEFAULT_TRANSACTION_URL: &str =
    "https://pac.intouch.capillarytech.com/addreturn-transaction-bulk";

/// Logical record type; selects the target endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecordKind {
    #[default]
    Customer,
    Transaction,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Transaction => "transaction",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint URL per record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub customer: String,
    pub transaction: String,
}

impl Endpoints {
    pub fn get(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Customer => &self.customer,
            RecordKind::Transaction => &self.transaction,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            customer: DEFAULT_CUSTOMER_URL.to_string(),
            transaction: DEFAULT_TRANSACTION_URL.to_string(),
        }
    }
}

/// Everything one run needs, passed to the [`Ingestor`](crate::Ingestor)
/// at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub file_path: PathBuf,
    pub batch_size: usize,
    pub kind: RecordKind,
    pub endpoints: Endpoints,
    pub rate_limit_per_minute: u32,
    pub retry: RetryPolicy,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            file_path: PathBuf::from(DEFAULT_FILE_PATH),
            batch_size: DEFAULT_BATCH_SIZE,
            kind: RecordKind::default(),
            endpoints: Endpoints::default(),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            retry: RetryPolicy::default(),
        }
    }
}

impl IngestConfig {
    /// URL the run submits to.
    pub fn endpoint(&self) -> &str {
        self.endpoints.get(self.kind)
    }

    /// Check everything that would make the run fail before its first request.
    ///
    /// Only the selected endpoint is checked; the other may be left unset.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::BatchSize(self.batch_size));
        }
        if self.rate_limit_per_minute == 0 {
            return Err(ConfigError::RateLimit(self.rate_limit_per_minute));
        }
        validate_url(self.kind, self.endpoint())?;
        self.retry.validate()
    }
}

fn validate_url(kind: RecordKind, url: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::Endpoint {
        kind: kind.to_string(),
        url: url.to_string(),
        reason,
    };
    let parsed = reqwest::Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "scheme must be http or https, not {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(())
}
