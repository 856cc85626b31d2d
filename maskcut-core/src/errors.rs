//! Tagged error taxonomy shared by the orchestration core and its collaborators
//!
//! Every external collaborator (masking capability, approval transport, chat
//! relay, audit sink) returns a `WorkflowError` whose variant already carries
//! its classification, so the job boundary maps errors to codes without
//! inspecting messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes surfaced to the outer protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobErrorCode {
    #[serde(rename = "E_USAGE")]
    Usage,
    #[serde(rename = "E_NETWORK")]
    Network,
    #[serde(rename = "E_TIMEOUT")]
    Timeout,
    #[serde(rename = "E_MASK_FAILED")]
    MaskFailed,
    #[serde(rename = "E_INTERNAL")]
    Internal,
    #[serde(rename = "E_CANCELLED")]
    Cancelled,
}

impl JobErrorCode {
    /// Wire representation used in status events and audit entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobErrorCode::Usage => "E_USAGE",
            JobErrorCode::Network => "E_NETWORK",
            JobErrorCode::Timeout => "E_TIMEOUT",
            JobErrorCode::MaskFailed => "E_MASK_FAILED",
            JobErrorCode::Internal => "E_INTERNAL",
            JobErrorCode::Cancelled => "E_CANCELLED",
        }
    }
}

impl std::fmt::Display for JobErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured failure carried by a terminal job result.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct JobError {
    pub code: JobErrorCode,
    pub message: String,
}

impl JobError {
    pub fn new(code: JobErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(JobErrorCode::Internal, message)
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(JobErrorCode::Usage, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(JobErrorCode::Cancelled, message)
    }
}

/// Errors raised by external collaborators during the per-job loop.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Caller or operator input was invalid.
    #[error("usage error: {0}")]
    Usage(String),
    /// A collaborator failed to reach its backend.
    #[error("network error: {0}")]
    Network(String),
    /// A collaborator gave up waiting on its backend.
    #[error("timeout: {0}")]
    Timeout(String),
    /// The masking capability could not produce a preview.
    #[error("masking failed: {0}")]
    MaskFailed(String),
    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    pub fn code(&self) -> JobErrorCode {
        match self {
            WorkflowError::Usage(_) => JobErrorCode::Usage,
            WorkflowError::Network(_) => JobErrorCode::Network,
            WorkflowError::Timeout(_) => JobErrorCode::Timeout,
            WorkflowError::MaskFailed(_) => JobErrorCode::MaskFailed,
            WorkflowError::Internal(_) => JobErrorCode::Internal,
        }
    }

    /// Message without the variant prefix, suitable for status events.
    pub fn detail(&self) -> &str {
        match self {
            WorkflowError::Usage(m)
            | WorkflowError::Network(m)
            | WorkflowError::Timeout(m)
            | WorkflowError::MaskFailed(m)
            | WorkflowError::Internal(m) => m,
        }
    }
}

impl From<WorkflowError> for JobError {
    fn from(err: WorkflowError) -> Self {
        JobError::new(err.code(), err.detail().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_names() {
        assert_eq!(JobErrorCode::Usage.as_str(), "E_USAGE");
        assert_eq!(JobErrorCode::Cancelled.as_str(), "E_CANCELLED");
        assert_eq!(JobErrorCode::MaskFailed.to_string(), "E_MASK_FAILED");
    }

    #[test]
    fn test_workflow_error_classification() {
        let err = WorkflowError::Timeout("relay gave up after 30s".to_string());
        let job_err: JobError = err.into();
        assert_eq!(job_err.code, JobErrorCode::Timeout);
        assert_eq!(job_err.message, "relay gave up after 30s");
    }

    #[test]
    fn test_job_error_downcast_from_anyhow() {
        let source = JobError::usage("missing text");
        let boxed: anyhow::Error = source.clone().into();
        let recovered = boxed.downcast::<JobError>().unwrap();
        assert_eq!(recovered, source);
    }
}
