// src/provider/mod.rs
// Generative provider port

mod gemini;
mod types;

pub use gemini::{GeminiAdapter, DEFAULT_GEMINI_BASE_URL};
pub use types::{ProviderError, ProviderRequest, ProviderResponse, UsageMetadata};

use crate::model::ModelChoice;
use async_trait::async_trait;

/// A generative-AI backend that turns a prompt plus inline audio into text.
#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Run one generation against the given model tier
    async fn generate(
        &self,
        model: ModelChoice,
        request: &ProviderRequest,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Get provider name
    fn name(&self) -> &str;
}
