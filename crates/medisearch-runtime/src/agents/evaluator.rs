//! Prompted evaluator backed by the generation service.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use medisearch_core::{
    Assessment, ClinicalValidation, ContradictionAnalysis, EvaluatorKind, Evidence,
    StatisticalValidation,
};
use tracing::{debug, instrument};

use super::traits::{AgentError, EvaluatorAgent};
use crate::prompts;
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider};

/// Evaluator for any [`Assessment`] type: render prompts, call, parse.
pub struct LlmEvaluator<A> {
    provider: Arc<dyn LlmProvider>,
    completion: CompletionConfig,
    _assessment: PhantomData<fn() -> A>,
}

pub type ClinicalAgent = LlmEvaluator<ClinicalValidation>;
pub type StatisticalAgent = LlmEvaluator<StatisticalValidation>;
pub type ContradictionAgent = LlmEvaluator<ContradictionAnalysis>;

impl<A: Assessment> LlmEvaluator<A> {
    pub fn new(provider: Arc<dyn LlmProvider>, completion: CompletionConfig) -> Self {
        Self {
            provider,
            completion,
            _assessment: PhantomData,
        }
    }
}

#[async_trait]
impl<A> EvaluatorAgent for LlmEvaluator<A>
where
    A: Assessment + Send + 'static,
{
    type Output = A;

    fn kind(&self) -> EvaluatorKind {
        A::KIND
    }

    #[instrument(skip_all, fields(evaluator = %A::KIND))]
    async fn evaluate(&self, answer: &str, evidence: &[Evidence]) -> Result<A, AgentError> {
        let messages = vec![
            ChatMessage::system(prompts::evaluator_system_prompt(A::KIND)),
            ChatMessage::user(prompts::evaluator_prompt(A::KIND, answer, evidence)),
        ];

        let response = self
            .provider
            .complete(messages, &self.completion)
            .await
            .map_err(|source| AgentError::Generation {
                kind: A::KIND,
                source,
            })?;

        let assessment = A::from_reply(&response.content);
        debug!(
            confidence = assessment.score().confidence,
            flags = ?assessment.score().flags,
            "Evaluator reply parsed"
        );
        Ok(assessment)
    }
}
