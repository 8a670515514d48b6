// src/draft/mod.rs
// Drafting boundary - validates uploads, runs the orchestrator, shapes replies

mod messages;
mod types;

pub use types::{
    CostSummary, DraftError, DraftResponse, DraftUpload, ErrorResponse, TranscriptionRequest,
};

use crate::config::{AppConfig, Language};
use crate::model::ModelChoice;
use crate::orchestrator::classifier::ErrorClassification;
use crate::orchestrator::retry::RetryPolicy;
use crate::orchestrator::{GenerationOrchestrator, OrchestratorError};
use crate::pricing::compute_cost;
use crate::prompt::build_prompt;
use crate::provider::{GenerativeProvider, ProviderError, ProviderRequest};
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_MIME_TYPE: &str = "audio/webm";

// Provider messages that mean the audio itself was rejected
const UNSUPPORTED_FORMAT_MARKERS: &[&str] = &[
    "Unsupported MIME type",
    "The string did not match the expected pattern",
];
const TOO_LARGE_MARKER: &str = "Request Entity Too Large";
const TOO_LARGE_STATUS: &str = "413";

/// Read-only settings shared by every request
#[derive(Debug, Clone)]
pub struct DraftSettings {
    pub max_upload_bytes: usize,
    pub request_timeout: Duration,
    pub retry_policy: RetryPolicy,
    pub default_model: ModelChoice,
    pub language: Language,
}

impl DraftSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes(),
            request_timeout: config.request_timeout(),
            retry_policy: config.retry_policy(),
            default_model: config.default_model(),
            language: config.language(),
        }
    }
}

pub struct DraftService {
    provider: Arc<dyn GenerativeProvider>,
    settings: DraftSettings,
}

impl DraftService {
    pub fn new(provider: Arc<dyn GenerativeProvider>, settings: DraftSettings) -> Self {
        tracing::info!(
            "DraftService initialized: provider={}, max_upload={}B, timeout={}s",
            provider.name(),
            settings.max_upload_bytes,
            settings.request_timeout.as_secs()
        );

        Self { provider, settings }
    }

    pub fn settings(&self) -> &DraftSettings {
        &self.settings
    }

    pub fn language(&self) -> Language {
        self.settings.language
    }

    /// Presence, size and format checks. Runs before any provider call.
    pub fn validate(&self, upload: DraftUpload) -> Result<TranscriptionRequest, DraftError> {
        let audio = match upload.audio {
            Some(audio) if !audio.is_empty() => audio,
            _ => return Err(DraftError::MissingAudio),
        };

        if audio.len() > self.settings.max_upload_bytes {
            return Err(DraftError::PayloadTooLarge {
                size: audio.len(),
                max: self.settings.max_upload_bytes,
            });
        }

        let mime_type = normalize_mime_type(upload.mime_type.as_deref())?;
        let model_preference =
            ModelChoice::from_form_value(upload.model.as_deref(), self.settings.default_model);

        Ok(TranscriptionRequest {
            audio,
            mime_type,
            model_preference,
            prior_text: upload.existing_text,
        })
    }

    pub async fn draft(&self, upload: DraftUpload) -> Result<DraftResponse, DraftError> {
        let request = self.validate(upload)?;
        let audio_kb = request.audio.len() / 1024;
        let preference = request.model_preference;

        tracing::info!(
            "Audio received: {}KB, {}, model={}, completion={}",
            audio_kb,
            request.mime_type,
            preference,
            request.prior_text.as_deref().is_some_and(|t| !t.trim().is_empty())
        );

        let provider_request = ProviderRequest {
            prompt: build_prompt(request.prior_text.as_deref()),
            audio: request.audio,
            mime_type: request.mime_type,
        };

        let orchestrator =
            GenerationOrchestrator::new(Arc::clone(&self.provider), self.settings.retry_policy);
        let deadline = Instant::now() + self.settings.request_timeout;

        let result = match orchestrator.run(preference, &provider_request, deadline).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    "Drafting failed after {} attempt(s): {}",
                    e.attempts().len(),
                    e
                );
                return Err(map_failure(&e));
            }
        };

        let content = result.text.trim().to_string();
        let cost = compute_cost(result.model_used, result.input_tokens, result.output_tokens);

        tracing::info!(
            "Draft ready ({}KB -> {} chars, {}, {:.6} EUR)",
            audio_kb,
            content.len(),
            result.model_used,
            cost.total_eur
        );

        Ok(DraftResponse {
            success: true,
            content,
            cost: CostSummary::new(&cost, result.input_tokens, result.output_tokens),
            fallback: result.did_fallback.then(|| {
                messages::fallback_note(preference, result.model_used, self.settings.language)
            }),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        })
    }
}

/// Accepts `audio/*`, drops parameters such as `;codecs=opus`.
/// A missing type is treated as webm, the browser recorder's default.
pub fn normalize_mime_type(input: Option<&str>) -> Result<String, DraftError> {
    let raw = match input.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(DEFAULT_MIME_TYPE.to_string()),
    };

    let essence = raw
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.strip_prefix("audio/") {
        Some(subtype) if !subtype.is_empty() => Ok(essence),
        _ => Err(DraftError::UnsupportedFormat(raw.to_string())),
    }
}

fn map_failure(error: &OrchestratorError) -> DraftError {
    match error {
        OrchestratorError::DeadlineExceeded { .. } => DraftError::Timeout,
        OrchestratorError::EmptyResponse { .. } => DraftError::EmptyResponse,
        OrchestratorError::Provider {
            classification,
            source,
            ..
        } => {
            let message = source.to_string();
            let rejected_size = matches!(
                source,
                ProviderError::Api { status, .. } if status.starts_with(TOO_LARGE_STATUS)
            ) || message.contains(TOO_LARGE_MARKER);

            // Quota wins over every message rule.
            if *classification == ErrorClassification::QuotaExceeded {
                DraftError::QuotaExceeded
            } else if UNSUPPORTED_FORMAT_MARKERS.iter().any(|m| message.contains(m)) {
                DraftError::UnsupportedFormat("rejected by provider".to_string())
            } else if rejected_size {
                DraftError::ProviderRejectedSize
            } else if source.is_timeout() || message.contains("timeout") {
                DraftError::Timeout
            } else {
                match classification {
                    ErrorClassification::NonRetryable => DraftError::Fatal,
                    _ => DraftError::Transient,
                }
            }
        }
    }
}
