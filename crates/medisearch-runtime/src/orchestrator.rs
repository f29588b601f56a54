//! Validation orchestrator: concurrent evaluator fan-out with weighted fan-in.
//!
//! The three evaluators run as one structured group. Each is bounded by
//! `evaluator_timeout`; the first failure cancels its siblings and the whole
//! group degrades to [`AggregateValidation::fallback`]. Malformed replies
//! never reach this level, agents absorb them into defaults.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use medisearch_core::{
    AggregateValidation, Assessment, ClinicalValidation, ContradictionAnalysis, Evidence,
    StatisticalValidation,
};
use tracing::{info, instrument, warn};

use crate::agents::{AgentError, ClinicalAgent, ContradictionAgent, EvaluatorAgent, StatisticalAgent};
use crate::config::RuntimeConfig;
use crate::providers::LlmProvider;

type Agent<A> = Arc<dyn EvaluatorAgent<Output = A>>;

/// Fans a generated answer out to the clinical, statistical, and
/// contradiction evaluators.
pub struct ValidationOrchestrator {
    clinical: Agent<ClinicalValidation>,
    statistical: Agent<StatisticalValidation>,
    contradiction: Agent<ContradictionAnalysis>,
    evaluator_timeout: Duration,
}

impl ValidationOrchestrator {
    /// Standard evaluators sharing one provider.
    pub fn new(provider: Arc<dyn LlmProvider>, config: &RuntimeConfig) -> Self {
        let completion = config.generation.evaluator_completion();
        Self {
            clinical: Arc::new(ClinicalAgent::new(provider.clone(), completion.clone())),
            statistical: Arc::new(StatisticalAgent::new(provider.clone(), completion.clone())),
            contradiction: Arc::new(ContradictionAgent::new(provider, completion)),
            evaluator_timeout: config.evaluator_timeout,
        }
    }

    /// Custom evaluators.
    pub fn with_agents(
        clinical: Agent<ClinicalValidation>,
        statistical: Agent<StatisticalValidation>,
        contradiction: Agent<ContradictionAnalysis>,
        evaluator_timeout: Duration,
    ) -> Self {
        Self {
            clinical,
            statistical,
            contradiction,
            evaluator_timeout,
        }
    }

    /// Validate an answer, substituting the fixed fallback if the fan-out fails.
    #[instrument(skip_all, fields(sources = evidence.len()))]
    pub async fn validate(&self, answer: &str, evidence: &[Evidence]) -> AggregateValidation {
        match self.try_validate(answer, evidence).await {
            Ok(validation) => {
                info!(overall = validation.overall_confidence, "Validation complete");
                validation
            }
            Err(e) => {
                warn!(error = %e, "Evaluator fan-out failed, using fallback validation");
                AggregateValidation::fallback()
            }
        }
    }

    /// Validate an answer, surfacing the first evaluator failure.
    pub async fn try_validate(
        &self,
        answer: &str,
        evidence: &[Evidence],
    ) -> Result<AggregateValidation, AgentError> {
        let (clinical, statistical, contradiction) = futures::future::try_join3(
            self.bounded(self.clinical.evaluate(answer, evidence), &*self.clinical),
            self.bounded(self.statistical.evaluate(answer, evidence), &*self.statistical),
            self.bounded(self.contradiction.evaluate(answer, evidence), &*self.contradiction),
        )
        .await?;

        Ok(AggregateValidation::from_scores(clinical, statistical, contradiction))
    }

    async fn bounded<A, F>(&self, call: F, agent: &dyn EvaluatorAgent<Output = A>) -> Result<A, AgentError>
    where
        A: Assessment + Send,
        F: Future<Output = Result<A, AgentError>>,
    {
        match tokio::time::timeout(self.evaluator_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(AgentError::Timeout {
                kind: agent.kind(),
                timeout: self.evaluator_timeout,
            }),
        }
    }
}
