//! Statistical rigor assessment.

use serde::{Deserialize, Serialize};

use super::{Assessment, EvaluatorKind, CONFIDENCE, REASONING};
use crate::reply::{FieldRule, ParsedReply};
use crate::validation::ValidationScore;

const STATISTICAL_SCORE: &str = "STATISTICAL_SCORE";
const METHODOLOGY_NOTES: &str = "METHODOLOGY_NOTES";

const RULES: &[FieldRule] = &[
    FieldRule::score(STATISTICAL_SCORE, 0.7),
    FieldRule::score(CONFIDENCE, 0.7),
    FieldRule::text(METHODOLOGY_NOTES, "Statistical evaluation completed."),
    FieldRule::text(REASONING, "Analysis based on available evidence."),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalValidation {
    #[serde(flatten)]
    pub score: ValidationScore,

    pub statistical_score: f64,

    #[serde(default)]
    pub methodology_notes: String,
}

impl Assessment for StatisticalValidation {
    const KIND: EvaluatorKind = EvaluatorKind::Statistical;

    fn rules() -> &'static [FieldRule] {
        RULES
    }

    fn from_parsed(parsed: &ParsedReply) -> Self {
        Self {
            score: ValidationScore::new(parsed.score(CONFIDENCE), parsed.text(REASONING)),
            statistical_score: parsed.score(STATISTICAL_SCORE),
            methodology_notes: parsed.text(METHODOLOGY_NOTES),
        }
    }

    fn score(&self) -> &ValidationScore {
        &self.score
    }

    fn score_mut(&mut self) -> &mut ValidationScore {
        &mut self.score
    }
}
