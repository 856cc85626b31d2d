//! Chat relay seam: forwarding approved masked text downstream

use crate::errors::WorkflowError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Everything the downstream chat consumer needs about an approved job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRelayPayload {
    pub job_id: String,
    pub approval_session_id: String,
    pub masked_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_message_id: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Unix milliseconds of the approval decision
    pub approved_at: i64,
}

/// Delivery of approved text to the chat consumer. Implementations own their
/// transport, retries, and timeouts; a non-success response surfaces as
/// `Network` or `Timeout`.
#[async_trait]
pub trait ChatRelay: Send + Sync {
    async fn send_approved_message(&self, payload: ChatRelayPayload) -> Result<(), WorkflowError>;
}
