//! LLM client and masking capability seams
//!
//! The wire protocol and the masking prompt both live outside this crate;
//! the orchestrator only sees these traits.

use crate::errors::WorkflowError;
use crate::models::{MaskingOptions, MaskingPreview};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One completion request against the configured model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub text: String,
}

/// Minimal LLM wire client. Implementations may perform network I/O and
/// should classify their failures (`Network`, `Timeout`) rather than
/// collapsing everything into `Internal`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, WorkflowError>;
}

/// The masking capability: turns raw text into a preview candidate using the
/// supplied LLM client. Prompt construction and heuristics are the
/// implementation's business.
#[async_trait]
pub trait Masker: Send + Sync {
    async fn mask(
        &self,
        llm: Arc<dyn LlmClient>,
        input: &str,
        options: &MaskingOptions,
    ) -> Result<MaskingPreview, WorkflowError>;
}
