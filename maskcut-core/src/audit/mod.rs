//! Audit trail recording
//!
//! Exactly one entry is recorded per terminal job outcome. Entries never
//! contain text content, only byte counts; the sink does not get to see
//! anything the status feed would not show a health endpoint.

use crate::errors::WorkflowError;
use crate::models::AuditEntry;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Destination for audit entries. Durable delivery is the sink's problem;
/// the orchestrator only guarantees it calls `record` once per outcome.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), WorkflowError>;
}

/// Append-only JSONL audit writer. With no path configured, `record` is a
/// silent no-op, which keeps the workflow usable without a durable backend.
pub struct JsonlAuditWriter {
    file_path: Option<PathBuf>,
}

impl JsonlAuditWriter {
    pub fn new(file_path: Option<PathBuf>) -> Self {
        Self { file_path }
    }

    /// Writer that drops every entry.
    pub fn disabled() -> Self {
        Self { file_path: None }
    }
}

#[async_trait]
impl AuditSink for JsonlAuditWriter {
    async fn record(&self, entry: AuditEntry) -> Result<(), WorkflowError> {
        let Some(path) = &self.file_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| WorkflowError::Internal(format!("audit dir: {e}")))?;
        }

        let mut line = serde_json::to_string(&entry)
            .map_err(|e| WorkflowError::Internal(format!("audit serialize: {e}")))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| WorkflowError::Internal(format!("audit open: {e}")))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| WorkflowError::Internal(format!("audit write: {e}")))?;

        tracing::debug!(job_id = %entry.job_id, decision = ?entry.decision, "audit entry recorded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::JobErrorCode;
    use crate::models::{AuditDecision, AuditStatus};
    use tempfile::tempdir;

    fn entry(job_id: &str) -> AuditEntry {
        AuditEntry {
            job_id: job_id.to_string(),
            status: AuditStatus::Failed,
            decision: AuditDecision::Reject,
            input_bytes: 9,
            masked_bytes: None,
            approved_at: None,
            relayed_at: None,
            error_code: Some(JobErrorCode::Usage),
            timestamp: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_disabled_writer_is_noop() {
        let writer = JsonlAuditWriter::disabled();
        writer.record(entry("job-1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_appends_one_json_line_per_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let writer = JsonlAuditWriter::new(Some(path.clone()));

        writer.record(entry("job-1")).await.unwrap();
        writer.record(entry("job-2")).await.unwrap();

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: AuditEntry = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.job_id, "job-1");
        assert_eq!(first.error_code, Some(JobErrorCode::Usage));
    }
}
