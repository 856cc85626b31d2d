//! Approval session lifecycle management

use crate::approval::transport::{ApprovalDecision, ApprovalPreviewPayload, ApprovalTransport};
use crate::errors::WorkflowError;
use crate::models::MaskingPreview;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle state of one approval session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalSessionState {
    /// A preview has been presented, no decision requested yet
    Previewing,
    /// Suspended on the transport's decision
    Waiting,
    Approved,
    Rejected,
    Editing,
}

/// One approval session and its decision history. A session spans every
/// preview iteration of a job; each edit re-enters it under the same id.
#[derive(Debug, Clone)]
pub struct ApprovalSession {
    pub job_id: String,
    pub approval_session_id: String,
    pub preview: MaskingPreview,
    pub state: ApprovalSessionState,
    pub history: Vec<ApprovalDecision>,
}

/// Manages approval sessions on top of an injected decision transport.
///
/// Sessions are retained for the lifetime of the controller, like an audit
/// trail; callers needing eviction should own it at a higher layer.
pub struct ApprovalController {
    transport: Arc<dyn ApprovalTransport>,
    sessions: DashMap<String, ApprovalSession>,
}

impl ApprovalController {
    pub fn new(transport: Arc<dyn ApprovalTransport>) -> Self {
        Self {
            transport,
            sessions: DashMap::new(),
        }
    }

    /// Create a session, or re-enter an existing one with a fresh preview.
    /// Allocates an id when the caller does not supply one. The preview is
    /// forwarded to the transport before returning.
    pub async fn create_session(
        &self,
        job_id: &str,
        preview: MaskingPreview,
        session_id: Option<String>,
    ) -> Result<String, WorkflowError> {
        let approval_session_id =
            session_id.unwrap_or_else(|| format!("approval-{}", Uuid::new_v4()));

        let session = ApprovalSession {
            job_id: job_id.to_string(),
            approval_session_id: approval_session_id.clone(),
            preview: preview.clone(),
            state: ApprovalSessionState::Previewing,
            history: self
                .sessions
                .get(&approval_session_id)
                .map(|existing| existing.history.clone())
                .unwrap_or_default(),
        };
        self.sessions.insert(approval_session_id.clone(), session);

        tracing::debug!(job_id, approval_session_id = %approval_session_id, "approval session previewing");

        self.transport
            .present_preview(ApprovalPreviewPayload {
                approval_session_id: approval_session_id.clone(),
                job_id: job_id.to_string(),
                preview,
            })
            .await?;

        Ok(approval_session_id)
    }

    /// Suspend until the transport delivers a decision for the session.
    /// Fails for ids that were never created.
    pub async fn await_decision(
        &self,
        approval_session_id: &str,
    ) -> Result<ApprovalDecision, WorkflowError> {
        {
            let mut session = self.sessions.get_mut(approval_session_id).ok_or_else(|| {
                WorkflowError::Internal(format!("unknown approval session: {approval_session_id}"))
            })?;
            session.state = ApprovalSessionState::Waiting;
        }
        // Guard dropped before the unbounded wait on the transport.

        let decision = self.transport.wait_for_decision(approval_session_id).await?;

        if let Some(mut session) = self.sessions.get_mut(approval_session_id) {
            session.history.push(decision.clone());
            session.state = match decision {
                ApprovalDecision::Approve { .. } => ApprovalSessionState::Approved,
                ApprovalDecision::Reject { .. } => ApprovalSessionState::Rejected,
                ApprovalDecision::Edit { .. } => ApprovalSessionState::Editing,
            };
        }

        tracing::debug!(approval_session_id, decision = ?decision, "approval decision received");
        Ok(decision)
    }

    /// Number of sessions ever created and still retained.
    pub fn active_session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of one session's record.
    pub fn session(&self, approval_session_id: &str) -> Option<ApprovalSession> {
        self.sessions
            .get(approval_session_id)
            .map(|entry| entry.clone())
    }
}
