//! Error taxonomy for route analysis.

use serde::Serialize;
use thiserror::Error;

/// Request-level failures. Anything that reaches the caller is one of these.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("routing service unavailable: {0}")]
    RoutingUnavailable(String),
    #[error("network store unavailable: {0}")]
    StoreUnavailable(String),
}

/// The four kinds a caller can distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    RoutingUnavailable,
    StoreUnavailable,
}

impl AnalysisError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnalysisError::InvalidInput(_) | AnalysisError::InvalidGeometry(_) => {
                ErrorKind::InvalidInput
            }
            AnalysisError::RoutingUnavailable(_) => ErrorKind::RoutingUnavailable,
            AnalysisError::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        AnalysisError::InvalidInput(message.into())
    }

    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        AnalysisError::InvalidGeometry(message.into())
    }

    /// Structured body for surfaces that report failures as JSON.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            status: "error",
            kind: self.kind(),
            error: self.to_string(),
        }
    }
}

/// Serializable failure object.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub kind: ErrorKind,
    pub error: String,
}

/// Failure of a single link lookup. Absorbed by the matcher, never surfaced.
#[derive(Debug, Error)]
pub enum LookupError {
    /// No connection to the backing store could be obtained.
    #[error("store unreachable: {0}")]
    Unavailable(String),
    /// The query itself failed (unknown table, bad column, type mismatch).
    #[error("lookup query failed: {0}")]
    Query(String),
}

/// Failure fetching or reading the live traffic feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("traffic feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("traffic feed API key is not configured")]
    MissingApiKey,
    #[error("traffic feed returned a malformed document: {0}")]
    Malformed(String),
}
