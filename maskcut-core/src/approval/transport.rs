//! Approval transport seam and the auto-approving implementation

use crate::errors::WorkflowError;
use crate::models::MaskingPreview;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// The human decision ending one preview iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ApprovalDecision {
    /// Relay the preview, or the operator's edited text when supplied
    Approve {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        edited_text: Option<String>,
    },
    /// Abort the job without relaying anything
    Reject {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// Re-run masking with a revised input under the same session
    Edit { revised_input: String },
}

/// Preview handed to the decision surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalPreviewPayload {
    pub approval_session_id: String,
    pub job_id: String,
    pub preview: MaskingPreview,
}

/// Where previews go and decisions come from. The wait is unbounded from the
/// core's perspective; any timeout belongs to the transport.
#[async_trait]
pub trait ApprovalTransport: Send + Sync {
    async fn present_preview(&self, payload: ApprovalPreviewPayload) -> Result<(), WorkflowError>;
    async fn wait_for_decision(
        &self,
        approval_session_id: &str,
    ) -> Result<ApprovalDecision, WorkflowError>;
}

/// Transport that approves every preview immediately. Useful for headless
/// runs and tests; keeps the last preview per session for inspection.
#[derive(Default)]
pub struct AutoApprovalTransport {
    previews: DashMap<String, ApprovalPreviewPayload>,
}

impl AutoApprovalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last preview presented for the given session, if any.
    pub fn last_preview(&self, approval_session_id: &str) -> Option<ApprovalPreviewPayload> {
        self.previews
            .get(approval_session_id)
            .map(|entry| entry.clone())
    }
}

#[async_trait]
impl ApprovalTransport for AutoApprovalTransport {
    async fn present_preview(&self, payload: ApprovalPreviewPayload) -> Result<(), WorkflowError> {
        self.previews
            .insert(payload.approval_session_id.clone(), payload);
        Ok(())
    }

    async fn wait_for_decision(
        &self,
        _approval_session_id: &str,
    ) -> Result<ApprovalDecision, WorkflowError> {
        Ok(ApprovalDecision::Approve { edited_text: None })
    }
}
