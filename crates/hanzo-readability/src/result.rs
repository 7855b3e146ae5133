//! Extraction result record

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ErrorKind, ExtractError};
use crate::timer::Timing;

/// Final state of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveStatus {
    Succeeded,
    Failed,
}

/// Why an extraction failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,

    /// Human-readable message
    pub message: String,

    /// Diagnostic lines, e.g. the exit code and the tail of the tool output
    pub hints: Vec<String>,
}

impl From<&ExtractError> for ErrorDetail {
    fn from(err: &ExtractError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
            hints: err.hints().to_vec(),
        }
    }
}

/// Outcome of a single extraction, produced exactly once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveResult {
    /// The exact argument vector executed
    pub cmd: Vec<String>,

    /// Working directory the command ran in
    pub pwd: PathBuf,

    /// Extractor version from configuration
    pub cmd_version: Option<String>,

    /// Directory holding the artifact set, set even on failure
    pub output: PathBuf,

    pub status: ArchiveStatus,

    /// Present iff `status` is `Failed`
    pub error: Option<ErrorDetail>,

    #[serde(flatten)]
    pub timing: Timing,
}

impl ArchiveResult {
    /// Build a record from the outcome of a run.
    pub fn new(
        cmd: Vec<String>,
        pwd: PathBuf,
        cmd_version: Option<String>,
        output: PathBuf,
        outcome: &Result<(), ExtractError>,
        timing: Timing,
    ) -> Self {
        let (status, error) = match outcome {
            Ok(()) => (ArchiveStatus::Succeeded, None),
            Err(err) => (ArchiveStatus::Failed, Some(ErrorDetail::from(err))),
        };
        Self {
            cmd,
            pwd,
            cmd_version,
            output,
            status,
            error,
            timing,
        }
    }

    pub fn is_succeeded(&self) -> bool {
        self.status == ArchiveStatus::Succeeded
    }

    pub fn is_failed(&self) -> bool {
        self.status == ArchiveStatus::Failed
    }

    /// Error classification, if the run failed
    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::RunTimer;

    fn timing() -> Timing {
        RunTimer::start().stop()
    }

    #[test]
    fn test_success_has_no_error() {
        let result = ArchiveResult::new(
            vec!["readability-extractor".into(), "/tmp/doc".into()],
            PathBuf::from("/archive/1"),
            Some("0.0.11".into()),
            PathBuf::from("/archive/1/readability"),
            &Ok(()),
            timing(),
        );
        assert!(result.is_succeeded());
        assert!(result.error.is_none());
        assert_eq!(result.error_kind(), None);
    }

    #[test]
    fn test_failure_carries_hints() {
        let err = ExtractError::NonZeroExit {
            code: Some(1),
            hints: vec!["Got readability response code: 1.".into(), "boom".into()],
        };
        let result = ArchiveResult::new(
            vec![],
            PathBuf::from("/archive/1"),
            None,
            PathBuf::from("/archive/1/readability"),
            &Err(err),
            timing(),
        );
        assert!(result.is_failed());
        let detail = result.error.unwrap();
        assert_eq!(detail.kind, ErrorKind::ToolExitedNonZero);
        assert_eq!(detail.hints.len(), 2);
    }

    #[test]
    fn test_serialized_shape() {
        let result = ArchiveResult::new(
            vec!["readability-extractor".into()],
            PathBuf::from("/archive/1"),
            None,
            PathBuf::from("/archive/1/readability"),
            &Err(ExtractError::Malformed("expected value".into())),
            timing(),
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"]["kind"], "output_malformed");
        assert!(json.get("start_ts").is_some());
        assert!(json.get("end_ts").is_some());
        assert!(json.get("duration").is_some());
    }
}
