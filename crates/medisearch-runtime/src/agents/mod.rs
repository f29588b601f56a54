//! Evaluator agents for answer validation.
//!
//! Each agent sends the generated answer and its sources to the generation
//! service with its own prompt pair, then parses the labeled reply into a
//! typed assessment.

mod evaluator;
mod traits;

pub use evaluator::{ClinicalAgent, ContradictionAgent, LlmEvaluator, StatisticalAgent};
pub use traits::{AgentError, EvaluatorAgent};
