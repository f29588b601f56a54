//! Answer gate: decides whether evidence is strong enough to answer.
//!
//! The gate is evaluated on the combiner output *before* evidence filters
//! run. Filters only change what is shown and cited, never the decision.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::Evidence;

/// Minimum top fused score required to generate an answer.
pub const GATE_THRESHOLD: f64 = 0.4;

/// Number of items returned alongside a weak-evidence message.
pub const WEAK_EVIDENCE_PREVIEW: usize = 3;

pub const NO_EVIDENCE_MESSAGE: &str = "No relevant information found.";

/// Outcome of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    /// Nothing survived fusion; skip generation entirely
    NoEvidence,

    /// Best evidence is below the gate threshold; skip generation
    WeakEvidence { top_score: f64 },

    /// Evidence is strong enough to build a context and generate
    Generate { top_score: f64 },
}

impl GateDecision {
    pub fn should_generate(&self) -> bool {
        matches!(self, GateDecision::Generate { .. })
    }

    pub fn top_score(&self) -> Option<f64> {
        match self {
            GateDecision::NoEvidence => None,
            GateDecision::WeakEvidence { top_score } | GateDecision::Generate { top_score } => {
                Some(*top_score)
            }
        }
    }
}

/// Three-state gate over ranked evidence.
#[derive(Debug, Clone)]
pub struct AnswerGate {
    threshold: f64,
}

impl AnswerGate {
    pub fn new() -> Self {
        Self {
            threshold: GATE_THRESHOLD,
        }
    }

    /// Decide from evidence sorted by descending relevance.
    pub fn decide(&self, evidence: &[Evidence]) -> GateDecision {
        let Some(top) = evidence.first() else {
            warn!("No evidence survived fusion");
            return GateDecision::NoEvidence;
        };

        let top_score = top.relevance_score;
        if top_score < self.threshold {
            warn!(top_score, threshold = self.threshold, "Evidence below answer gate");
            GateDecision::WeakEvidence { top_score }
        } else {
            GateDecision::Generate { top_score }
        }
    }

    /// User-facing message for a weak-evidence outcome.
    pub fn weak_evidence_message(top_score: f64) -> String {
        format!(
            "No highly relevant sources found. Best match: {:.2}. Try different terms.",
            top_score
        )
    }

    /// The items shown with a weak-evidence message.
    pub fn weak_evidence_preview(evidence: &[Evidence]) -> Vec<Evidence> {
        evidence.iter().take(WEAK_EVIDENCE_PREVIEW).cloned().collect()
    }
}

impl Default for AnswerGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(score: f64) -> Evidence {
        Evidence {
            id: format!("doc-{}", score),
            paper_id: "p".to_string(),
            title: "t".to_string(),
            relevance_score: score,
            excerpt: String::new(),
            origin: "pubmed".to_string(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_empty_is_no_evidence() {
        assert_eq!(AnswerGate::new().decide(&[]), GateDecision::NoEvidence);
        assert_eq!(NO_EVIDENCE_MESSAGE, "No relevant information found.");
    }

    #[test]
    fn test_weak_evidence_below_threshold() {
        let items: Vec<Evidence> = [0.35, 0.34, 0.33, 0.32, 0.31].iter().map(|s| evidence(*s)).collect();
        let decision = AnswerGate::new().decide(&items);
        assert_eq!(decision, GateDecision::WeakEvidence { top_score: 0.35 });
        assert!(!decision.should_generate());

        let message = AnswerGate::weak_evidence_message(0.35);
        assert!(message.contains("Best match: 0.35"));
        assert_eq!(AnswerGate::weak_evidence_preview(&items).len(), 3);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let decision = AnswerGate::new().decide(&[evidence(0.4)]);
        assert!(decision.should_generate());
        assert_eq!(decision.top_score(), Some(0.4));
    }
}
