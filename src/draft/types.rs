// src/draft/types.rs
// Request/response types and error definitions for the drafting boundary

use super::messages;
use crate::config::Language;
use crate::model::ModelChoice;
use crate::pricing::CostBreakdown;
use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Raw fields as received from the transport layer
#[derive(Debug, Clone, Default)]
pub struct DraftUpload {
    pub audio: Option<Vec<u8>>,
    pub mime_type: Option<String>,
    pub model: Option<String>,
    pub existing_text: Option<String>,
}

/// Validated request. Immutable once built.
#[derive(Debug, Clone)]
pub struct TranscriptionRequest {
    pub audio: Vec<u8>,
    pub mime_type: String,
    pub model_preference: ModelChoice,
    pub prior_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    #[serde(rename = "totalEUR")]
    pub total_eur: f64,
    #[serde(rename = "totalUSD")]
    pub total_usd: f64,
    pub input_tokens: u64,
    pub output_tokens: u64,
    /// Provider model id actually used
    pub model: String,
}

impl CostSummary {
    pub fn new(cost: &CostBreakdown, input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            total_eur: cost.total_eur,
            total_usd: cost.total_usd,
            input_tokens,
            output_tokens,
            model: cost.model.model_id().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftResponse {
    pub success: bool,
    pub content: String,
    pub cost: CostSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Failures surfaced to the caller. Provider text is never carried here;
/// it is logged where the failure is mapped.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("no audio file provided")]
    MissingAudio,

    #[error("audio too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("upload exceeds {max} bytes")]
    UploadTooLarge { max: usize },

    #[error("provider rejected the audio size")]
    ProviderRejectedSize,

    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("processing timeout")]
    Timeout,

    #[error("provider quota exceeded")]
    QuotaExceeded,

    #[error("provider temporarily unavailable")]
    Transient,

    #[error("provider request failed")]
    Fatal,

    #[error("empty model response")]
    EmptyResponse,
}

impl DraftError {
    pub fn status(&self) -> StatusCode {
        match self {
            DraftError::MissingAudio
            | DraftError::UnsupportedFormat(_)
            | DraftError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            DraftError::PayloadTooLarge { .. }
            | DraftError::UploadTooLarge { .. }
            | DraftError::ProviderRejectedSize => StatusCode::PAYLOAD_TOO_LARGE,
            DraftError::Timeout => StatusCode::REQUEST_TIMEOUT,
            DraftError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            DraftError::Transient | DraftError::Fatal | DraftError::EmptyResponse => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn user_message(&self, language: Language) -> String {
        messages::for_error(self, language)
    }

    pub fn to_response(&self, language: Language) -> ErrorResponse {
        ErrorResponse {
            success: false,
            error: self.user_message(language),
        }
    }
}
