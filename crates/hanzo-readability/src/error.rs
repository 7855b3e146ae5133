//! Error types for readability extraction

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::process::ProcessError;

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Coarse classification of a failed extraction, as recorded in an
/// [`ArchiveResult`](crate::ArchiveResult).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RetrievalFailed,
    ToolTimedOut,
    ToolExitedNonZero,
    OutputMalformed,
    IoFailed,
}

/// Errors that can occur while extracting a document
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Network error during fetch
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP error response
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The extractor did not exit before the deadline
    #[error("Readability timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    /// The extractor exited with a failure status
    #[error("Readability was not able to archive the page")]
    NonZeroExit {
        code: Option<i32>,
        hints: Vec<String>,
    },

    /// The extractor output was not the expected JSON object
    #[error("Malformed readability output: {0}")]
    Malformed(String),

    /// The extractor could not be started
    #[error("Failed to start readability: {0}")]
    Spawn(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// The classification stored in the result record.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Network(_) | ExtractError::Http { .. } | ExtractError::InvalidUrl(_) => {
                ErrorKind::RetrievalFailed
            }
            ExtractError::Timeout(_) => ErrorKind::ToolTimedOut,
            ExtractError::NonZeroExit { .. } => ErrorKind::ToolExitedNonZero,
            ExtractError::Malformed(_) => ErrorKind::OutputMalformed,
            ExtractError::Spawn(_) | ExtractError::Io(_) => ErrorKind::IoFailed,
        }
    }

    /// Diagnostic lines attached to the error, if any.
    pub fn hints(&self) -> &[String] {
        match self {
            ExtractError::NonZeroExit { hints, .. } => hints,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for ExtractError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            ExtractError::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ExtractError::Network(err.to_string())
        }
    }
}

impl From<url::ParseError> for ExtractError {
    fn from(err: url::ParseError) -> Self {
        ExtractError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Malformed(err.to_string())
    }
}

impl From<ProcessError> for ExtractError {
    fn from(err: ProcessError) -> Self {
        match err {
            ProcessError::Timeout(after) => ExtractError::Timeout(after),
            ProcessError::EmptyCommand => ExtractError::Spawn(err.to_string()),
            ProcessError::Spawn { .. } => ExtractError::Spawn(err.to_string()),
            ProcessError::Io(e) => ExtractError::Io(e),
        }
    }
}
