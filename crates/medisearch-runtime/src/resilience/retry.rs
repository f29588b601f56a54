//! Bounded retry for generation calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use crate::config::RetryConfig;
use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// Decorator that retries transient failures of the wrapped provider.
///
/// Delays grow exponentially from `min_delay` and are capped at `max_delay`.
/// At most `max_attempts` calls are made; the last error is returned.
pub struct RetryingProvider {
    inner: Arc<dyn LlmProvider>,
    policy: RetryConfig,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, policy: RetryConfig) -> Self {
        Self { inner, policy }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.policy.min_delay)
            .with_max_delay(self.policy.max_delay)
            .with_max_times(self.policy.max_attempts.saturating_sub(1))
    }
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        (|| async { self.inner.complete(messages.clone(), config).await })
            .retry(self.backoff())
            .when(ProviderError::is_transient)
            .notify(|err: &ProviderError, delay: Duration| {
                warn!(
                    provider = self.inner.name(),
                    error = %err,
                    delay = ?delay,
                    "Generation call failed, retrying"
                );
            })
            .await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
