//! Error types for the customer health query engine.
//!
//! | Error             | Handling                                          |
//! |-------------------|---------------------------------------------------|
//! | IngestError::*    | Show "no data available", fall back to empty set  |
//! | DashboardError::* | Reject the event, keep the current view           |
//!
//! Row-level malformation and numeric coercion failures are not errors: the
//! row is skipped (and recorded on the dataset) or the value becomes `0`.

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("empty CSV data received")]
    Empty,

    #[error("CSV must have at least a header and one data row")]
    MissingDataRows,

    #[error("malformed header: {0}")]
    MalformedHeader(String),

    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema: {0}")]
    Schema(String),
}

impl IngestError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::Io { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DashboardError {
    #[error("no filter clause with id {0}")]
    UnknownClause(Uuid),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
