// src/provider/types.rs
// Provider request/response types and error definitions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Everything the provider needs for one generation call.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Instructional prompt text
    pub prompt: String,
    /// Raw audio bytes, sent inline
    pub audio: Vec<u8>,
    /// MIME type of `audio` (e.g. "audio/webm")
    pub mime_type: String,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageMetadata {
    pub prompt_token_count: u64,
    pub candidates_token_count: u64,
    pub total_token_count: u64,
}

/// Successful provider answer. `text` may be empty; the orchestrator decides
/// what an empty answer means.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: UsageMetadata,
}

/// Provider errors. The `Display` text is what the error classifier reads,
/// so HTTP failures always carry the numeric status.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timeout")]
    Timeout,

    #[error("Gemini API error {status}: {message}")]
    Api { status: String, message: String },

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Timeout)
    }
}
