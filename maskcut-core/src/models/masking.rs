//! Masking request options and preview payloads

use serde::{Deserialize, Serialize};

/// Symbol family used to replace sensitive spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum MaskingStyle {
    /// Solid block characters
    #[default]
    Block,
    /// Three asterisks
    Asterisk,
    /// Literal `[MASK]` tag
    MaskTag,
}

/// Options forwarded opaquely to the masking capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MaskingOptions {
    #[serde(default)]
    pub style: MaskingStyle,
    /// Preserve the character count of masked spans
    #[serde(default)]
    pub keep_length: bool,
    /// Language hint for entity detection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Also mask entities the model is unsure about
    #[serde(default)]
    pub mask_unknown_entities: bool,
    /// Model override for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// One masked-text candidate produced by the masking capability and shown to
/// a human before relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaskingPreview {
    pub masked_text: String,
    pub original_text: String,
}
