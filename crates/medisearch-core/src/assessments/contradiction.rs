//! Cross-source contradiction assessment.

use serde::{Deserialize, Serialize};

use super::{Assessment, EvaluatorKind, CONFIDENCE, REASONING};
use crate::reply::{FieldRule, ParsedReply};
use crate::validation::ValidationScore;

const CONTRADICTION_LEVEL: &str = "CONTRADICTION_LEVEL";
const CONFLICTING_SOURCES: &str = "CONFLICTING_SOURCES";

const RULES: &[FieldRule] = &[
    FieldRule::level(CONTRADICTION_LEVEL, ContradictionLevel::Low),
    FieldRule::list(CONFLICTING_SOURCES),
    FieldRule::score(CONFIDENCE, 0.8),
    FieldRule::text(REASONING, "No significant contradictions detected."),
];

/// Degree of disagreement between sources.
///
/// `Unknown` is only produced by the fan-out fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl ContradictionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContradictionLevel::Low => "low",
            ContradictionLevel::Medium => "medium",
            ContradictionLevel::High => "high",
            ContradictionLevel::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContradictionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContradictionAnalysis {
    #[serde(flatten)]
    pub score: ValidationScore,

    #[serde(rename = "contradiction_level")]
    pub level: ContradictionLevel,

    #[serde(default)]
    pub conflicting_sources: Vec<String>,
}

impl Assessment for ContradictionAnalysis {
    const KIND: EvaluatorKind = EvaluatorKind::Contradiction;

    fn rules() -> &'static [FieldRule] {
        RULES
    }

    fn from_parsed(parsed: &ParsedReply) -> Self {
        Self {
            score: ValidationScore::new(parsed.score(CONFIDENCE), parsed.text(REASONING)),
            level: parsed.level(CONTRADICTION_LEVEL),
            conflicting_sources: parsed.list(CONFLICTING_SOURCES),
        }
    }

    fn score(&self) -> &ValidationScore {
        &self.score
    }

    fn score_mut(&mut self) -> &mut ValidationScore {
        &mut self.score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::SOFT_PARSE_FLAG;

    #[test]
    fn test_full_reply() {
        let reply = "CONTRADICTION_LEVEL: Medium - dosing differs\n\
                     CONFLICTING_SOURCES: Source 2 vs Source 4\n\
                     CONFIDENCE: 0.9\n\
                     REASONING: Two trials disagree on titration.";
        let result = ContradictionAnalysis::from_reply(reply);

        assert_eq!(result.level, ContradictionLevel::Medium);
        assert_eq!(result.conflicting_sources, vec!["Source 2 vs Source 4"]);
        assert_eq!(result.score.confidence, 0.9);
        assert!(result.score.flags.is_empty());
    }

    #[test]
    fn test_unrecognized_level_defaults_to_low() {
        let result = ContradictionAnalysis::from_reply("CONTRADICTION_LEVEL: severe\nCONFIDENCE: 0.85");
        assert_eq!(result.level, ContradictionLevel::Low);
        assert_eq!(result.score.confidence, 0.85);
        assert!(result.score.has_flag(SOFT_PARSE_FLAG));
    }

    #[test]
    fn test_missing_confidence_defaults_to_point_eight() {
        let result = ContradictionAnalysis::from_reply("CONTRADICTION_LEVEL: low\nCONFLICTING_SOURCES: None");
        assert_eq!(result.score.confidence, 0.8);
        assert!(result.conflicting_sources.is_empty());
        assert_eq!(result.score.reasoning, "No significant contradictions detected.");
    }
}
