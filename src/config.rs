use crate::model::ModelChoice;
use crate::orchestrator::retry::RetryPolicy;
use crate::provider::DEFAULT_GEMINI_BASE_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_UPLOAD_MB: u64 = 50;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;
const DEFAULT_MAX_ATTEMPTS: u8 = 3;
const MAX_ATTEMPTS_CAP: u8 = 5;
const DEFAULT_BASE_DELAY_SECS: u64 = 2;
const DEFAULT_FIXED_DELAY_SECS: u64 = 3;
const BYTES_PER_MB: u64 = 1024 * 1024;

pub const DEFAULT_LANGUAGE: &str = "en";
pub const DEFAULT_MODEL: &str = "pro";
pub const STRATEGY_EXPONENTIAL: &str = "exponential";
pub const STRATEGY_FIXED: &str = "fixed";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

/// Language of user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    En,
    Fr,
}

/// Process-wide settings. Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub default_model: String,
    pub max_upload_mb: u64,
    pub request_timeout_secs: u64,
    pub retry: RetrySettings,
    pub language: String,
    pub log_format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            gemini_api_key: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            retry: RetrySettings::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            log_format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub strategy: String,
    pub max_attempts: u8,
    pub base_delay_secs: u64,
    pub fixed_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            strategy: STRATEGY_EXPONENTIAL.to_string(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_secs: DEFAULT_BASE_DELAY_SECS,
            fixed_delay_secs: DEFAULT_FIXED_DELAY_SECS,
        }
    }
}

impl AppConfig {
    /// JSON file (optional) < environment variables < normalisation
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => read_file(path)?,
            None => AppConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        normalize_config(&mut config);
        Ok(config)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key.trim().to_string());
        }
        if let Some(url) = get("GEMINI_BASE_URL") {
            self.gemini_base_url = url.trim().to_string();
        }
        if let Some(host) = get("VOICE_DRAFT_HOST") {
            self.host = host.trim().to_string();
        }
        if let Some(port) = get("PORT") {
            self.port = parse_var("PORT", &port)?;
        }
        if let Some(model) = get("VOICE_DRAFT_DEFAULT_MODEL") {
            self.default_model = model;
        }
        if let Some(mb) = get("VOICE_DRAFT_MAX_UPLOAD_MB") {
            self.max_upload_mb = parse_var("VOICE_DRAFT_MAX_UPLOAD_MB", &mb)?;
        }
        if let Some(secs) = get("VOICE_DRAFT_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_var("VOICE_DRAFT_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(strategy) = get("VOICE_DRAFT_RETRY_STRATEGY") {
            self.retry.strategy = strategy;
        }
        if let Some(attempts) = get("VOICE_DRAFT_RETRY_MAX_ATTEMPTS") {
            self.retry.max_attempts = parse_var("VOICE_DRAFT_RETRY_MAX_ATTEMPTS", &attempts)?;
        }
        if let Some(language) = get("VOICE_DRAFT_LANGUAGE") {
            self.language = language;
        }
        if let Some(format) = get("LOG_FORMAT") {
            self.log_format = format;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.gemini_api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(ConfigError::MissingApiKey),
        }
    }

    pub fn default_model(&self) -> ModelChoice {
        ModelChoice::parse(&self.default_model).unwrap_or_default()
    }

    pub fn language(&self) -> Language {
        match normalize_language(&self.language).as_str() {
            "fr" => Language::Fr,
            _ => Language::En,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(BYTES_PER_MB) as usize
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn json_logs(&self) -> bool {
        self.log_format.trim().eq_ignore_ascii_case("json")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        match normalize_strategy(&self.retry.strategy).as_str() {
            STRATEGY_FIXED => RetryPolicy::fixed(Duration::from_secs(self.retry.fixed_delay_secs)),
            _ => RetryPolicy::exponential(
                self.retry.max_attempts,
                Duration::from_secs(self.retry.base_delay_secs),
            ),
        }
    }
}

pub fn normalize_language(input: &str) -> String {
    match input.trim().to_lowercase().as_str() {
        "en" => "en".to_string(),
        "fr" => "fr".to_string(),
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

pub fn normalize_strategy(input: &str) -> String {
    match input.trim().to_lowercase().as_str() {
        STRATEGY_FIXED => STRATEGY_FIXED.to_string(),
        _ => STRATEGY_EXPONENTIAL.to_string(),
    }
}

fn read_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str::<AppConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_var<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn normalize_config(config: &mut AppConfig) {
    config.language = normalize_language(&config.language);
    config.retry.strategy = normalize_strategy(&config.retry.strategy);
    config.retry.max_attempts = config.retry.max_attempts.clamp(1, MAX_ATTEMPTS_CAP);

    if ModelChoice::parse(&config.default_model).is_none() {
        tracing::warn!("Unknown default model '{}', using pro", config.default_model);
        config.default_model = DEFAULT_MODEL.to_string();
    }
    if config.max_upload_mb == 0 {
        config.max_upload_mb = DEFAULT_MAX_UPLOAD_MB;
    }
    if config.request_timeout_secs == 0 {
        config.request_timeout_secs = DEFAULT_REQUEST_TIMEOUT_SECS;
    }
    if config.gemini_base_url.trim().is_empty() {
        config.gemini_base_url = DEFAULT_GEMINI_BASE_URL.to_string();
    }
}
