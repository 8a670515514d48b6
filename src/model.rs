// src/model.rs
// Model catalogue - maps the user-facing tier to a provider model id

use serde::{Deserialize, Serialize};
use std::fmt;

pub const FAST_MODEL_ID: &str = "gemini-2.5-flash";
pub const ACCURATE_MODEL_ID: &str = "gemini-2.5-pro";

/// Model tier requested by the caller.
///
/// `Fast` is the cheaper tier and the fallback target after a quota failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    #[serde(alias = "flash")]
    Fast,
    #[default]
    #[serde(alias = "pro")]
    Accurate,
}

impl ModelChoice {
    /// Concrete provider model identifier
    pub fn model_id(self) -> &'static str {
        match self {
            ModelChoice::Fast => FAST_MODEL_ID,
            ModelChoice::Accurate => ACCURATE_MODEL_ID,
        }
    }

    /// Short label used in user-facing notes
    pub fn label(self) -> &'static str {
        match self {
            ModelChoice::Fast => "Flash",
            ModelChoice::Accurate => "Pro",
        }
    }

    pub fn is_fast_tier(self) -> bool {
        self == ModelChoice::Fast
    }

    /// Parse a form value ("flash" | "pro", also "fast" | "accurate").
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "flash" | "fast" => Some(ModelChoice::Fast),
            "pro" | "accurate" => Some(ModelChoice::Accurate),
            _ => None,
        }
    }

    /// Parse a form value, falling back to `default` when absent or unknown.
    pub fn from_form_value(input: Option<&str>, default: ModelChoice) -> Self {
        match input {
            Some(value) if !value.trim().is_empty() => Self::parse(value).unwrap_or_else(|| {
                tracing::debug!("Unknown model '{}', using {}", value, default);
                default
            }),
            _ => default,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_id())
    }
}
