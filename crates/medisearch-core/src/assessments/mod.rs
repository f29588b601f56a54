//! Evaluator assessments.
//!
//! Each evaluator axis owns a result type and a declarative rule set for its
//! labeled reply. Turning a raw reply into a result is uniform across axes:
//! apply the rules, build the result, flag it if any field was defaulted.

mod clinical;
mod contradiction;
mod statistical;

pub use clinical::ClinicalValidation;
pub use contradiction::{ContradictionAnalysis, ContradictionLevel};
pub use statistical::StatisticalValidation;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::reply::{parse_reply, FieldRule, ParsedReply, SOFT_PARSE_FLAG};
use crate::validation::ValidationScore;

/// Field label shared by every evaluator.
pub(crate) const CONFIDENCE: &str = "CONFIDENCE";
pub(crate) const REASONING: &str = "REASONING";

/// The three independent evaluation axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorKind {
    Clinical,
    Statistical,
    Contradiction,
}

impl EvaluatorKind {
    pub const ALL: [EvaluatorKind; 3] = [
        EvaluatorKind::Clinical,
        EvaluatorKind::Statistical,
        EvaluatorKind::Contradiction,
    ];

    /// Weight of this axis in the overall confidence. Weights sum to 1.
    pub fn weight(&self) -> f64 {
        match self {
            EvaluatorKind::Clinical => 0.4,
            EvaluatorKind::Statistical => 0.3,
            EvaluatorKind::Contradiction => 0.3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluatorKind::Clinical => "clinical",
            EvaluatorKind::Statistical => "statistical",
            EvaluatorKind::Contradiction => "contradiction",
        }
    }
}

impl std::fmt::Display for EvaluatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed evaluator result built from a labeled reply.
pub trait Assessment: Sized {
    const KIND: EvaluatorKind;

    /// Labeled fields this evaluator expects, with their defaults.
    fn rules() -> &'static [FieldRule];

    /// Build the result from already-parsed fields.
    fn from_parsed(parsed: &ParsedReply) -> Self;

    fn score(&self) -> &ValidationScore;

    fn score_mut(&mut self) -> &mut ValidationScore;

    /// Parse a raw reply. Never fails; malformed fields keep their defaults
    /// and the result carries the soft parse flag.
    fn from_reply(reply: &str) -> Self {
        let parsed = parse_reply(reply, Self::rules());
        let mut assessment = Self::from_parsed(&parsed);

        if parsed.is_degraded() {
            debug!(
                evaluator = %Self::KIND,
                fields = ?parsed.defaulted(),
                "Evaluator reply partially defaulted"
            );
            assessment.score_mut().flags.insert(SOFT_PARSE_FLAG.to_string());
        }

        assessment
    }
}
