#[cfg(test)]
#[path = "retry_test.rs"]
mod tests;

use std::time::Duration;

use rand::Rng;
use tokio::time;

use crate::domain::models::BackendBox;
use crate::domain::models::ClassifiedError;
use crate::domain::models::Generation;
use crate::domain::models::GenerationError;
use crate::domain::models::GenerationRequest;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub base_delay: Duration,
    /// Upper bound of the random delay added on top of each backoff.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        return RetryPolicy {
            max_attempts: 5,
            attempt_timeout: Duration::from_millis(193_333),
            base_delay: Duration::from_millis(1_233),
            max_jitter: Duration::from_millis(1_000),
        };
    }
}

impl RetryPolicy {
    /// `base * 2^attempt` plus jitter, where `attempt` is zero based.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << attempt.min(16));

        let mut jitter_ms = 0;
        let max_jitter_ms = self.max_jitter.as_millis() as u64;
        if max_jitter_ms > 0 {
            jitter_ms = rand::thread_rng().gen_range(0..=max_jitter_ms);
        }

        return Duration::from_millis(delay_ms.saturating_add(jitter_ms));
    }
}

/// Runs one generation with a deadline per attempt and exponential backoff
/// between attempts.
pub struct RetryingGenerationClient {
    backend: BackendBox,
    policy: RetryPolicy,
}

impl RetryingGenerationClient {
    pub fn new(backend: BackendBox, policy: RetryPolicy) -> RetryingGenerationClient {
        return RetryingGenerationClient { backend, policy };
    }

    async fn attempt(&self, request: &GenerationRequest) -> Result<Generation, GenerationError> {
        let res = time::timeout(self.policy.attempt_timeout, self.backend.generate(request))
            .await
            .unwrap_or(Err(GenerationError::Timeout(self.policy.attempt_timeout)))?;

        if let Some(text) = res.text {
            return Ok(Generation {
                text,
                grounding_chunks: res.grounding_chunks,
            });
        }

        return Err(GenerationError::MalformedResponse(
            "Response did not contain any text".to_string(),
        ));
    }

    pub async fn generate(&self, request: GenerationRequest) -> Result<Generation, ClassifiedError> {
        let max_attempts = self.policy.max_attempts.max(1);

        let mut attempt = 0;
        loop {
            let err = match self.attempt(&request).await {
                Ok(generation) => return Ok(generation),
                Err(err) => err,
            };

            attempt += 1;
            tracing::warn!(
                attempt = attempt,
                model = %request.backend_model_id,
                backend = %self.backend.name(),
                error = %err,
                "Generation attempt failed"
            );

            if attempt >= max_attempts || !err.is_retryable() {
                return Err(ClassifiedError::new(&err, attempt));
            }

            time::sleep(self.policy.backoff(attempt - 1)).await;
        }
    }
}
