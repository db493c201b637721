//! Error types for reference-data ingestion
//!
//! Only [`IngestError`] can stop a run. The other types here are recovered at
//! their own granularity (page, row, batch) and end up tallied in the
//! [`RunReport`](crate::framework::report::RunReport).

use ppn_common::ConfigError;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for ingestion operations
pub type Result<T> = std::result::Result<T, IngestError>;

/// Unrecoverable ingestion errors
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A setup read the run depends on failed (e.g. the known-names lookup)
    #[error("Setup failed for {job}: {reason}")]
    Setup { job: String, reason: String },
}

impl IngestError {
    pub fn setup(job: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Setup {
            job: job.into(),
            reason: reason.into(),
        }
    }
}

/// Why a single page request failed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FetchFailure {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A page that could not be fetched, with enough context to log and move on
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("Failed to fetch page {page} for '{term}': {cause}")]
pub struct FetchError {
    /// Query term being paginated ("" for unparameterized sources)
    pub term: String,
    /// 1-based page index
    pub page: usize,
    pub cause: FetchFailure,
}

/// Why the normalizer refused a raw record
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rejection {
    #[error("missing required field '{0}'")]
    MissingRequiredField(&'static str),

    #[error("invalid value for '{field}': {raw:?}")]
    InvalidType { field: &'static str, raw: String },

    #[error("missing primary identifier")]
    MissingPrimaryIdentifier,
}

impl Rejection {
    pub fn invalid(field: &'static str, raw: impl Into<String>) -> Self {
        Self::InvalidType {
            field,
            raw: raw.into(),
        }
    }

    /// Stable key used to tally skips by reason
    pub fn tally_key(&self) -> String {
        match self {
            Self::MissingRequiredField(field) => format!("missing_required_field({})", field),
            Self::InvalidType { field, .. } => format!("invalid_type({})", field),
            Self::MissingPrimaryIdentifier => "missing_primary_identifier".to_string(),
        }
    }
}

/// A batch the write target refused or never acknowledged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchFailure {
    /// 1-based batch number in submission order
    pub batch: usize,
    pub rows: usize,
    /// `None` when the request never got a response (transport error, timeout)
    pub status: Option<u16>,
    /// Target-provided diagnostic, truncated
    pub body: String,
}
