//! Answer generation from an assembled context.

use std::sync::Arc;

use medisearch_core::AssembledContext;
use tracing::{info, instrument, warn};

use crate::prompts;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};

/// Asks the generation service for a cited answer.
pub struct AnswerGenerator {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
}

impl AnswerGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
        }
    }

    /// Generate an answer for `query`. The returned text is trimmed.
    #[instrument(skip_all, fields(sources = context.sources_used, words = context.word_count))]
    pub async fn generate(
        &self,
        query: &str,
        context: &AssembledContext,
    ) -> Result<String, ProviderError> {
        let messages = vec![
            ChatMessage::system(prompts::ANSWER_SYSTEM_PROMPT),
            ChatMessage::user(prompts::answer_prompt(query, &context.text)),
        ];

        let response = self.provider.complete(messages, &self.completion).await?;
        if response.truncated() {
            warn!(max_tokens = self.completion.max_tokens, "Answer hit the token limit");
        }
        info!(
            model = %response.model,
            tokens = response.usage.total(),
            "Answer generated"
        );
        Ok(response.content.trim().to_string())
    }
}
