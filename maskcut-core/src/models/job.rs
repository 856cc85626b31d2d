//! Masking job, job results, and status events

use crate::errors::JobError;
use crate::models::masking::MaskingOptions;
use serde::{Deserialize, Serialize};

/// One end-to-end request to mask a text and carry it through approval to
/// relay. Created once at submission and never mutated afterwards; the edit
/// loop's revised input lives in a local variable, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskingJob {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub options: MaskingOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_message_id: Option<String>,
    pub approval_session_id: String,
    /// Unix milliseconds at submission
    pub requested_at: i64,
}

/// Lifecycle state of a job as seen by status consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskingJobState {
    #[serde(rename = "queued")]
    Queued,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "waiting-approval")]
    WaitingApproval,
    #[serde(rename = "succeeded")]
    Succeeded,
    #[serde(rename = "failed")]
    Failed,
}

/// One entry in the bounded status broadcast log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskingStatusEvent {
    pub job_id: String,
    pub state: MaskingJobState,
    /// Whether the queue had pending or running work when this was emitted
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl MaskingStatusEvent {
    /// Minimal event carrying only a job id and state; optional fields are
    /// filled by the emitter.
    pub fn new(job_id: impl Into<String>, state: MaskingJobState) -> Self {
        Self {
            job_id: job_id.into(),
            state,
            locked: false,
            masked_text: None,
            model: None,
            endpoint: None,
            message: None,
            error_code: None,
        }
    }
}

/// Payload of a successfully relayed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSuccess {
    pub masked_text: String,
    pub model: String,
    pub endpoint: String,
    /// Unix milliseconds
    pub finished_at: i64,
}

/// Terminal outcome delivered through a job's one-shot result handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MaskingJobResult {
    #[serde(rename = "succeeded")]
    Succeeded(JobSuccess),
    #[serde(rename = "failed")]
    Failed { error: JobError },
}

impl MaskingJobResult {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, MaskingJobResult::Succeeded(_))
    }

    /// The structured error of a failed result, if any.
    pub fn error(&self) -> Option<&JobError> {
        match self {
            MaskingJobResult::Failed { error } => Some(error),
            MaskingJobResult::Succeeded(_) => None,
        }
    }
}
