//! Error types for each stage of a run.
//!
//! Per-source failures ([`FetchError`], [`ExtractionFault`]) are reported and
//! contained by the orchestrator. [`DedupError`] means shared storage is
//! unusable and aborts the run. [`DeliveryError`] belongs to the digest sink
//! and is surfaced to whoever triggered the run.

use thiserror::Error;

/// Failure to retrieve a source's front page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP client could not be built: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = e.status() {
            FetchError::Status {
                url: url.to_string(),
                status,
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                source: e,
            }
        }
    }
}

/// A page that cannot be walked at all.
///
/// Individual blocks with broken links are skipped, not reported here.
#[derive(Debug, Error)]
pub enum ExtractionFault {
    #[error("base URL {base:?} is not usable: {source}")]
    BaseUrl {
        base: String,
        #[source]
        source: url::ParseError,
    },
}

/// The sent-articles store is unreachable or a query failed.
#[derive(Debug, Error)]
pub enum DedupError {
    #[error("could not prepare database directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The digest could not be handed to its recipients.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("digest delivery is not configured: {0}")]
    NotConfigured(String),

    #[error("invalid mailbox {address:?}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    #[error("could not build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP transport failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("could not serialize digest: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not write digest: {0}")]
    Io(#[from] std::io::Error),
}

/// Invalid settings file or roster.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("duplicate source name {0:?}")]
    DuplicateSource(String),

    #[error("source {name:?} has an invalid base URL {base_url:?}")]
    InvalidBaseUrl { name: String, base_url: String },

    #[error("invalid schedule time {0:?}, expected HH:MM")]
    Schedule(String),

    #[error("pipeline concurrency must be at least 1")]
    Concurrency,
}

/// A fault in the orchestration itself. Per-source faults never become this.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("dedup store failure: {0}")]
    Store(#[from] DedupError),
}

/// Outcome of a full scan-and-deliver run that did not complete.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("found {found} new articles but delivery failed: {source}")]
    Delivery {
        found: usize,
        #[source]
        source: DeliveryError,
    },
}
