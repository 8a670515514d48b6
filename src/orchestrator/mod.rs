use crate::model::ModelChoice;
use crate::provider::{GenerativeProvider, ProviderError, ProviderRequest};
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};

use self::attempt::{AttemptLog, AttemptOutcome};
use self::classifier::{classify, ErrorClassification};
use self::retry::RetryPolicy;

pub mod attempt;
pub mod classifier;
pub mod retry;

/// Successful outcome of one orchestrator run
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub text: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub model_used: ModelChoice,
    pub did_fallback: bool,
    pub attempts: AttemptLog,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("generation failed on {model} ({classification:?}): {source}")]
    Provider {
        classification: ErrorClassification,
        source: ProviderError,
        model: ModelChoice,
        did_fallback: bool,
        attempts: AttemptLog,
    },

    #[error("empty model response from {model}")]
    EmptyResponse {
        model: ModelChoice,
        attempts: AttemptLog,
    },

    #[error("request deadline exceeded on {model}")]
    DeadlineExceeded {
        model: ModelChoice,
        attempts: AttemptLog,
    },
}

impl OrchestratorError {
    pub fn classification(&self) -> ErrorClassification {
        match self {
            OrchestratorError::Provider { classification, .. } => *classification,
            OrchestratorError::EmptyResponse { .. } => ErrorClassification::NonRetryable,
            OrchestratorError::DeadlineExceeded { .. } => ErrorClassification::Retryable,
        }
    }

    pub fn attempts(&self) -> &AttemptLog {
        match self {
            OrchestratorError::Provider { attempts, .. }
            | OrchestratorError::EmptyResponse { attempts, .. }
            | OrchestratorError::DeadlineExceeded { attempts, .. } => attempts,
        }
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Fallback(ModelChoice),
    Retry,
    Fail,
}

/// Drives one request through attempts, retries and the one-shot quota
/// fallback. Holds no state between runs; build one per request.
pub struct GenerationOrchestrator {
    provider: Arc<dyn GenerativeProvider>,
    policy: RetryPolicy,
}

impl GenerationOrchestrator {
    pub fn new(provider: Arc<dyn GenerativeProvider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    /// Attempts are strictly sequential. Every provider call and backoff is
    /// bounded by `deadline`.
    pub async fn run(
        &self,
        preference: ModelChoice,
        request: &ProviderRequest,
        deadline: Instant,
    ) -> Result<GenerationResult, OrchestratorError> {
        let mut model = preference;
        let mut attempt: u8 = 1;
        let mut did_fallback = false;
        let mut unknown_retry_used = false;
        let mut log = AttemptLog::new();

        loop {
            tracing::info!(
                "Attempting {} via {} (attempt {}/{})",
                model,
                self.provider.name(),
                attempt,
                self.policy.max_attempts()
            );

            let result = match timeout_at(deadline, self.provider.generate(model, request)).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("{} attempt {} abandoned: request deadline reached", model, attempt);
                    log.record(model, attempt, AttemptOutcome::RetryableFailure);
                    return Err(OrchestratorError::DeadlineExceeded {
                        model,
                        attempts: log,
                    });
                }
            };

            let error = match result {
                Ok(response) => {
                    if response.text.trim().is_empty() {
                        tracing::warn!("{} returned an empty response", model);
                        log.record(model, attempt, AttemptOutcome::FatalFailure);
                        return Err(OrchestratorError::EmptyResponse {
                            model,
                            attempts: log,
                        });
                    }

                    log.record(model, attempt, AttemptOutcome::Success);
                    tracing::info!(
                        "{} succeeded: text_len={}, fallback={}",
                        model,
                        response.text.len(),
                        did_fallback
                    );
                    return Ok(GenerationResult {
                        text: response.text,
                        input_tokens: response.usage.prompt_token_count,
                        output_tokens: response.usage.candidates_token_count,
                        model_used: model,
                        did_fallback,
                        attempts: log,
                    });
                }
                Err(error) => error,
            };

            let classification = classify(&error.to_string());
            log.record(model, attempt, outcome_for(classification));
            tracing::warn!(
                "{} attempt {}/{} failed ({:?}): {}",
                model,
                attempt,
                self.policy.max_attempts(),
                classification,
                error
            );

            match self.next_transition(model, attempt, classification, did_fallback, unknown_retry_used) {
                Transition::Fallback(fallback) => {
                    tracing::info!("Quota reached for {}, falling back to {}", model, fallback);
                    model = fallback;
                    attempt = 1;
                    did_fallback = true;
                }
                Transition::Retry => {
                    if classification == ErrorClassification::Unknown {
                        unknown_retry_used = true;
                    }
                    if !self.policy.wait_before_retry(attempt, deadline).await {
                        return Err(OrchestratorError::Provider {
                            classification,
                            source: error,
                            model,
                            did_fallback,
                            attempts: log,
                        });
                    }
                    attempt += 1;
                }
                Transition::Fail => {
                    return Err(OrchestratorError::Provider {
                        classification,
                        source: error,
                        model,
                        did_fallback,
                        attempts: log,
                    });
                }
            }
        }
    }

    // Quota fallback is checked before the generic retry.
    fn next_transition(
        &self,
        model: ModelChoice,
        attempt: u8,
        classification: ErrorClassification,
        did_fallback: bool,
        unknown_retry_used: bool,
    ) -> Transition {
        if classification == ErrorClassification::QuotaExceeded
            && !model.is_fast_tier()
            && !did_fallback
        {
            return Transition::Fallback(ModelChoice::Fast);
        }

        if self
            .policy
            .should_retry(attempt, classification, unknown_retry_used)
        {
            Transition::Retry
        } else {
            Transition::Fail
        }
    }
}

fn outcome_for(classification: ErrorClassification) -> AttemptOutcome {
    match classification {
        ErrorClassification::QuotaExceeded => AttemptOutcome::QuotaFailure,
        ErrorClassification::Retryable | ErrorClassification::Unknown => {
            AttemptOutcome::RetryableFailure
        }
        ErrorClassification::NonRetryable => AttemptOutcome::FatalFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ProviderResponse, UsageMetadata};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
        calls: Mutex<Vec<ModelChoice>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<ModelChoice> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeProvider for ScriptedProvider {
        async fn generate(
            &self,
            model: ModelChoice,
            _request: &ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            self.calls.lock().unwrap().push(model);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl GenerativeProvider for HangingProvider {
        async fn generate(
            &self,
            _model: ModelChoice,
            _request: &ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(text("too late"))
        }

        fn name(&self) -> &str {
            "hanging"
        }
    }

    fn text(s: &str) -> ProviderResponse {
        ProviderResponse {
            text: s.to_string(),
            usage: UsageMetadata {
                prompt_token_count: 1000,
                candidates_token_count: 500,
                total_token_count: 1500,
            },
        }
    }

    fn api_error(status: &str, message: &str) -> ProviderError {
        ProviderError::Api {
            status: status.to_string(),
            message: message.to_string(),
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            prompt: "draft".to_string(),
            audio: vec![1, 2, 3],
            mime_type: "audio/webm".to_string(),
        }
    }

    fn deadline() -> Instant {
        Instant::now() + Duration::from_secs(600)
    }

    async fn run(
        provider: Arc<ScriptedProvider>,
        policy: RetryPolicy,
        preference: ModelChoice,
    ) -> Result<GenerationResult, OrchestratorError> {
        GenerationOrchestrator::new(provider, policy)
            .run(preference, &request(), deadline())
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success() {
        let provider = ScriptedProvider::new(vec![Ok(text("Dear team,"))]);

        let result = run(provider.clone(), RetryPolicy::default(), ModelChoice::Fast)
            .await
            .unwrap();

        assert_eq!(result.text, "Dear team,");
        assert_eq!(result.input_tokens, 1000);
        assert_eq!(result.output_tokens, 500);
        assert_eq!(result.model_used, ModelChoice::Fast);
        assert!(!result.did_fallback);
        assert_eq!(provider.calls(), vec![ModelChoice::Fast]);
        assert_eq!(result.attempts.attempts()[0].outcome, AttemptOutcome::Success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_falls_back_to_fast_once() {
        let provider = ScriptedProvider::new(vec![
            Err(api_error("429 Too Many Requests", "quota exceeded")),
            Ok(text("fallback draft")),
        ]);

        let result = run(provider.clone(), RetryPolicy::default(), ModelChoice::Accurate)
            .await
            .unwrap();

        assert!(result.did_fallback);
        assert_eq!(result.model_used, ModelChoice::Fast);
        assert_eq!(provider.calls(), vec![ModelChoice::Accurate, ModelChoice::Fast]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_on_fallback_never_falls_back_twice() {
        let provider = ScriptedProvider::new(vec![
            Err(api_error("429 Too Many Requests", "quota exceeded")),
            Err(api_error("429 Too Many Requests", "quota exceeded")),
            Ok(text("unreachable")),
        ]);

        let err = run(provider.clone(), RetryPolicy::default(), ModelChoice::Accurate)
            .await
            .unwrap_err();

        assert_eq!(err.classification(), ErrorClassification::QuotaExceeded);
        assert_eq!(provider.calls(), vec![ModelChoice::Accurate, ModelChoice::Fast]);
        assert_eq!(err.attempts().calls_to(ModelChoice::Fast), 1);
        match err {
            OrchestratorError::Provider { did_fallback, .. } => assert!(did_fallback),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_on_fast_preference_fails_immediately() {
        let provider = ScriptedProvider::new(vec![Err(api_error(
            "429 Too Many Requests",
            "rate limited",
        ))]);

        let err = run(provider.clone(), RetryPolicy::default(), ModelChoice::Fast)
            .await
            .unwrap_err();

        assert_eq!(err.classification(), ErrorClassification::QuotaExceeded);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overloaded_retries_three_times_with_backoff() {
        let provider = ScriptedProvider::new(vec![
            Err(api_error("503 Service Unavailable", "The model is overloaded.")),
            Err(api_error("503 Service Unavailable", "The model is overloaded.")),
            Err(api_error("503 Service Unavailable", "The model is overloaded.")),
            Ok(text("unreachable")),
        ]);
        let started = Instant::now();

        let err = run(provider.clone(), RetryPolicy::default(), ModelChoice::Accurate)
            .await
            .unwrap_err();

        assert_eq!(err.classification(), ErrorClassification::Retryable);
        assert_eq!(provider.calls().len(), 3);
        // 2s + 4s of backoff between the three calls
        assert_eq!(started.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_then_success() {
        let provider = ScriptedProvider::new(vec![
            Err(ProviderError::Network("connection reset".into())),
            Ok(text("second time lucky")),
        ]);

        let result = run(provider.clone(), RetryPolicy::default(), ModelChoice::Accurate)
            .await
            .unwrap();

        assert_eq!(result.text, "second time lucky");
        assert!(!result.did_fallback);
        assert_eq!(result.attempts.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_forbidden_is_not_retried() {
        let provider = ScriptedProvider::new(vec![
            Err(api_error("403 Forbidden", "permission denied")),
            Ok(text("unreachable")),
        ]);

        let err = run(provider.clone(), RetryPolicy::default(), ModelChoice::Accurate)
            .await
            .unwrap_err();

        assert_eq!(err.classification(), ErrorClassification::NonRetryable);
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_is_a_failure() {
        let provider = ScriptedProvider::new(vec![Ok(text("   ")), Ok(text("unreachable"))]);

        let err = run(provider.clone(), RetryPolicy::default(), ModelChoice::Fast)
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::EmptyResponse { .. }));
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_error_gets_one_retry() {
        let provider = ScriptedProvider::new(vec![
            Err(api_error("418 I'm a teapot", "odd")),
            Err(api_error("418 I'm a teapot", "odd")),
            Ok(text("unreachable")),
        ]);

        let err = run(provider.clone(), RetryPolicy::default(), ModelChoice::Fast)
            .await
            .unwrap_err();

        assert_eq!(err.classification(), ErrorClassification::Unknown);
        assert_eq!(provider.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_model_can_retry() {
        let provider = ScriptedProvider::new(vec![
            Err(api_error("429 Too Many Requests", "quota")),
            Err(api_error("503 Service Unavailable", "overloaded")),
            Ok(text("made it")),
        ]);

        let result = run(provider.clone(), RetryPolicy::default(), ModelChoice::Accurate)
            .await
            .unwrap();

        assert!(result.did_fallback);
        assert_eq!(
            provider.calls(),
            vec![ModelChoice::Accurate, ModelChoice::Fast, ModelChoice::Fast]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_policy_single_retry() {
        let provider = ScriptedProvider::new(vec![
            Err(api_error("500 Internal Server Error", "boom")),
            Err(api_error("500 Internal Server Error", "boom")),
            Ok(text("unreachable")),
        ]);
        let started = Instant::now();

        let err = run(
            provider.clone(),
            RetryPolicy::fixed(Duration::from_secs(3)),
            ModelChoice::Fast,
        )
        .await
        .unwrap_err();

        assert_eq!(err.classification(), ErrorClassification::Retryable);
        assert_eq!(provider.calls().len(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_abandons_in_flight_attempt() {
        let orchestrator = GenerationOrchestrator::new(Arc::new(HangingProvider), RetryPolicy::default());
        let deadline = Instant::now() + Duration::from_secs(30);

        let err = orchestrator
            .run(ModelChoice::Accurate, &request(), deadline)
            .await
            .unwrap_err();

        assert!(matches!(err, OrchestratorError::DeadlineExceeded { .. }));
        assert_eq!(err.classification(), ErrorClassification::Retryable);
        assert_eq!(err.attempts().len(), 1);
    }
}
