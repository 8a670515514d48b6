use super::classifier::ErrorClassification;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Delay schedule between attempts on the same model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// base * 2^(attempt-1): with a 2s base, 2s, 4s, 8s
    Exponential { base: Duration },
    /// Same delay every time
    Fixed { delay: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u8,
    backoff: Backoff,
}

impl RetryPolicy {
    pub fn exponential(max_attempts: u8, base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { base },
        }
    }

    /// Fixed delay, one retry at most.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            max_attempts: 2,
            backoff: Backoff::Fixed { delay },
        }
    }

    pub fn max_attempts(&self) -> u8 {
        self.max_attempts
    }

    /// `attempt` is the 1-based number of the attempt that just failed.
    /// Unknown failures get a single retry opportunity per run.
    pub fn should_retry(
        &self,
        attempt: u8,
        classification: ErrorClassification,
        unknown_retry_used: bool,
    ) -> bool {
        if attempt >= self.max_attempts {
            return false;
        }

        match classification {
            ErrorClassification::Retryable => true,
            ErrorClassification::Unknown => !unknown_retry_used,
            ErrorClassification::QuotaExceeded | ErrorClassification::NonRetryable => false,
        }
    }

    pub fn delay_for(&self, attempt: u8) -> Duration {
        match self.backoff {
            Backoff::Exponential { base } => {
                let multiplier = 2u32.saturating_pow(attempt.saturating_sub(1) as u32);
                base.saturating_mul(multiplier)
            }
            Backoff::Fixed { delay } => delay,
        }
    }

    /// Sleep before the next attempt. Returns false without sleeping when the
    /// delay would run past `deadline`.
    pub async fn wait_before_retry(&self, attempt: u8, deadline: Instant) -> bool {
        let delay = self.delay_for(attempt);
        let wake_at = Instant::now() + delay;
        if wake_at >= deadline {
            tracing::warn!(
                "Not retrying: {}s backoff would pass the request deadline",
                delay.as_secs()
            );
            return false;
        }

        tracing::info!(
            "Retrying in {}s (attempt {})",
            delay.as_secs(),
            attempt + 1
        );
        sleep_until(wake_at).await;
        true
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_secs(2))
    }
}
