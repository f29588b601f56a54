//! Clinical relevance and safety assessment.

use serde::{Deserialize, Serialize};

use super::{Assessment, EvaluatorKind, CONFIDENCE, REASONING};
use crate::reply::{FieldRule, ParsedReply};
use crate::validation::ValidationScore;

const CLINICAL_RELEVANCE: &str = "CLINICAL_RELEVANCE";
const SAFETY_CONCERNS: &str = "SAFETY_CONCERNS";

const RULES: &[FieldRule] = &[
    FieldRule::score(CLINICAL_RELEVANCE, 0.7),
    FieldRule::score(CONFIDENCE, 0.7),
    FieldRule::list(SAFETY_CONCERNS),
    FieldRule::text(REASONING, "Clinical evaluation completed."),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalValidation {
    #[serde(flatten)]
    pub score: ValidationScore,

    /// How well the answer addresses the clinical question, in `[0, 1]`
    pub clinical_relevance: f64,

    #[serde(default)]
    pub safety_concerns: Vec<String>,
}

impl Assessment for ClinicalValidation {
    const KIND: EvaluatorKind = EvaluatorKind::Clinical;

    fn rules() -> &'static [FieldRule] {
        RULES
    }

    fn from_parsed(parsed: &ParsedReply) -> Self {
        Self {
            score: ValidationScore::new(parsed.score(CONFIDENCE), parsed.text(REASONING)),
            clinical_relevance: parsed.score(CLINICAL_RELEVANCE),
            safety_concerns: parsed.list(SAFETY_CONCERNS),
        }
    }

    fn score(&self) -> &ValidationScore {
        &self.score
    }

    fn score_mut(&mut self) -> &mut ValidationScore {
        &mut self.score
    }
}
