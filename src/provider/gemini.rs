// src/provider/gemini.rs
// Google Gemini generateContent adapter (prompt + inline audio)

use super::{GenerativeProvider, ProviderError, ProviderRequest, ProviderResponse, UsageMetadata};
use crate::model::ModelChoice;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiAdapter {
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        tracing::info!("Gemini adapter initialized ({})", base_url);

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, model: ModelChoice) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url,
            model.model_id()
        )
    }
}

/// Concatenated text of the first candidate, like the SDK's `response.text()`.
fn candidate_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::Network(e.without_url().to_string())
    }
}

#[async_trait]
impl GenerativeProvider for GeminiAdapter {
    async fn generate(
        &self,
        model: ModelChoice,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError> {
        tracing::debug!(
            "Gemini: {} bytes of {} to {}",
            request.audio.len(),
            request.mime_type,
            model
        );

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: &request.prompt,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: &request.mime_type,
                            data: BASE64_STANDARD.encode(&request.audio),
                        },
                    },
                ],
            }],
        };

        let response = self
            .client
            .post(self.endpoint(model))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.to_string(),
                message: api_error_message(&body),
            });
        }

        let raw = response.text().await.map_err(transport_error)?;
        let parsed: GenerateContentResponse = serde_json::from_str(&raw)
            .map_err(|e| ProviderError::InvalidResponse(format!("Gemini parse: {}", e)))?;

        Ok(ProviderResponse {
            text: candidate_text(&parsed),
            usage: parsed.usage_metadata.unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
