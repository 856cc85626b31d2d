//! Audit trail records
//!
//! Audit entries are privacy-safe: they carry byte counts of the original
//! and relayed texts, never the texts themselves. Keep it that way.

use crate::errors::JobErrorCode;
use serde::{Deserialize, Serialize};

/// Terminal status of the audited job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Approved,
    Failed,
}

/// What ended the job: a human decision or an internal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditDecision {
    Approve,
    Reject,
    Error,
}

/// Write-once record of one job's terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub job_id: String,
    pub status: AuditStatus,
    pub decision: AuditDecision,
    /// Byte length of the originally submitted text
    pub input_bytes: u64,
    /// Byte length of the relayed text, present only on approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relayed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<JobErrorCode>,
    /// Unix milliseconds at recording time
    pub timestamp: i64,
}
