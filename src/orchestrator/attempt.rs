use crate::model::ModelChoice;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AttemptOutcome {
    Success,
    RetryableFailure,
    QuotaFailure,
    FatalFailure,
}

/// One provider call made while serving a request. Kept only for the
/// lifetime of the request, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAttempt {
    pub model: ModelChoice,
    pub attempt_number: u8,
    pub outcome: AttemptOutcome,
}

/// Ordered log of the attempts of one orchestrator run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttemptLog {
    attempts: Vec<GenerationAttempt>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, model: ModelChoice, attempt_number: u8, outcome: AttemptOutcome) {
        self.attempts.push(GenerationAttempt {
            model,
            attempt_number,
            outcome,
        });
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    pub fn calls_to(&self, model: ModelChoice) -> usize {
        self.attempts.iter().filter(|a| a.model == model).count()
    }

    pub fn attempts(&self) -> &[GenerationAttempt] {
        &self.attempts
    }
}
