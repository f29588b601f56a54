//! Evaluator agent trait and common types.

use async_trait::async_trait;
use medisearch_core::{Assessment, EvaluatorKind, Evidence};
use std::time::Duration;
use thiserror::Error;

use crate::providers::ProviderError;

/// Errors from evaluator agents.
///
/// Reply parsing never fails; only the call itself can.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("{kind} evaluator call failed: {source}")]
    Generation {
        kind: EvaluatorKind,
        #[source]
        source: ProviderError,
    },

    #[error("{kind} evaluator timed out after {timeout:?}")]
    Timeout { kind: EvaluatorKind, timeout: Duration },
}

/// An independent scorer along one evaluation axis.
///
/// # Isolation Contract
/// - MUST NOT see other evaluators' results
/// - MUST NOT share mutable state with other agents
/// - MUST absorb malformed replies into defaults instead of failing
#[async_trait]
pub trait EvaluatorAgent: Send + Sync {
    type Output: Assessment + Send;

    fn kind(&self) -> EvaluatorKind;

    /// Assess `answer` against the evidence it was generated from.
    async fn evaluate(&self, answer: &str, evidence: &[Evidence])
        -> Result<Self::Output, AgentError>;
}
