//! Per-evaluator scores and their weighted aggregate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::assessments::{
    ClinicalValidation, ContradictionAnalysis, ContradictionLevel, EvaluatorKind,
    StatisticalValidation,
};
use crate::clamp_unit;

/// Confidence assigned to every evaluator when the fan-out cannot complete.
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Flag attached to fallback scores.
pub const ERROR_FLAG: &str = "error";

pub const FALLBACK_REASONING: &str = "Validation incomplete";

/// Common core of every evaluator result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationScore {
    /// Always within `[0, 1]`
    pub confidence: f64,

    pub reasoning: String,

    /// Diagnostic flags such as `soft_parse_failure` or `error`
    #[serde(default)]
    pub flags: BTreeSet<String>,
}

impl ValidationScore {
    pub fn new(confidence: f64, reasoning: impl Into<String>) -> Self {
        Self {
            confidence: clamp_unit(confidence),
            reasoning: reasoning.into(),
            flags: BTreeSet::new(),
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    fn fallback() -> Self {
        Self::new(FALLBACK_CONFIDENCE, FALLBACK_REASONING).with_flag(ERROR_FLAG)
    }
}

/// Confidence breakdown for one generated answer.
///
/// Derived from exactly three evaluator results; `overall_confidence` is never
/// set independently of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateValidation {
    #[serde(rename = "clinical_expert")]
    pub clinical: ClinicalValidation,

    #[serde(rename = "statistical_validator")]
    pub statistical: StatisticalValidation,

    #[serde(rename = "contradiction_detector")]
    pub contradiction: ContradictionAnalysis,

    pub overall_confidence: f64,
}

impl AggregateValidation {
    /// Combine three evaluator results with the fixed 0.4 / 0.3 / 0.3 weights.
    pub fn from_scores(
        clinical: ClinicalValidation,
        statistical: StatisticalValidation,
        contradiction: ContradictionAnalysis,
    ) -> Self {
        let overall = EvaluatorKind::Clinical.weight() * clinical.score.confidence
            + EvaluatorKind::Statistical.weight() * statistical.score.confidence
            + EvaluatorKind::Contradiction.weight() * contradiction.score.confidence;

        Self {
            clinical,
            statistical,
            contradiction,
            overall_confidence: clamp_unit(overall),
        }
    }

    /// Fixed degraded result used when the evaluator fan-out fails.
    pub fn fallback() -> Self {
        Self::from_scores(
            ClinicalValidation {
                score: ValidationScore::fallback(),
                clinical_relevance: FALLBACK_CONFIDENCE,
                safety_concerns: Vec::new(),
            },
            StatisticalValidation {
                score: ValidationScore::fallback(),
                statistical_score: FALLBACK_CONFIDENCE,
                methodology_notes: FALLBACK_REASONING.to_string(),
            },
            ContradictionAnalysis {
                score: ValidationScore::fallback(),
                level: ContradictionLevel::Unknown,
                conflicting_sources: Vec::new(),
            },
        )
    }

    /// True when this is the fan-out fallback rather than real evaluator output.
    pub fn is_fallback(&self) -> bool {
        self.clinical.score.has_flag(ERROR_FLAG)
            && self.statistical.score.has_flag(ERROR_FLAG)
            && self.contradiction.score.has_flag(ERROR_FLAG)
    }
}
