//! Prompt templates for answer generation and the three evaluators.
//!
//! System prompts are constants. User prompts are rendered per request from
//! the query, the assembled context, or the generated answer plus a short
//! list of source titles.

use medisearch_core::{EvaluatorKind, Evidence};

/// Number of evidence titles shown to an evaluator.
pub const EVALUATOR_SOURCE_LIMIT: usize = 5;

const TITLE_CHARS: usize = 80;

/// System prompt for answer generation.
pub const ANSWER_SYSTEM_PROMPT: &str = r#"You are a medical research assistant. Provide CONCISE answers in this format:

### Summary
[2-3 sentence direct answer to the query]

### Key Findings
- **Finding 1:** Brief description [1][2]
- **Finding 2:** Brief description [3]
- **Finding 3:** Brief description [4][5]

### Research Details
[Optional: Mention study types, populations, or methodological details if relevant]

CRITICAL RULES:
- ONLY use information from provided sources
- Cite EVERY statement with [1], [2], etc.
- If sources don't match query: State clearly in 1-2 sentences
- NO phrases like "Assessing relevance" or "Sources that discuss"
- Get straight to the answer"#;

pub const CLINICAL_SYSTEM_PROMPT: &str = r#"You are a senior clinical medical expert. Evaluate the clinical validity of medical information.
Focus on:
1. Clinical relevance and applicability
2. Patient safety considerations
3. Evidence quality from clinical perspective
4. Practical clinical implications

Provide scores between 0.0-1.0 and clear reasoning."#;

pub const STATISTICAL_SYSTEM_PROMPT: &str = r#"You are a biostatistics expert. Evaluate the statistical validity of medical research.
Focus on:
1. Statistical methodology quality
2. Sample size adequacy
3. P-value and confidence interval interpretation
4. Study design appropriateness

Provide scores between 0.0-1.0 and clear reasoning."#;

pub const CONTRADICTION_SYSTEM_PROMPT: &str = r#"You are an expert at analyzing medical literature for contradictions and conflicts.
Focus on:
1. Conflicting findings across studies
2. Contradictory conclusions
3. Inconsistent evidence
4. Consensus vs disagreement

Rate contradiction level as: low, medium, or high."#;

const CLINICAL_REQUEST: &str = r#"Provide:
1. Clinical Relevance Score (0.0-1.0)
2. Overall Confidence Score (0.0-1.0)
3. Safety Concerns (list any, or "None identified")
4. Clinical Reasoning (brief explanation)

Format:
CLINICAL_RELEVANCE: [score]
CONFIDENCE: [score]
SAFETY_CONCERNS: [list or "None identified"]
REASONING: [explanation]"#;

const STATISTICAL_REQUEST: &str = r#"Provide:
1. Statistical Score (0.0-1.0) - quality of statistical methods
2. Overall Confidence (0.0-1.0)
3. Methodology Notes (concerns or strengths)
4. Reasoning

Format:
STATISTICAL_SCORE: [score]
CONFIDENCE: [score]
METHODOLOGY_NOTES: [notes]
REASONING: [explanation]"#;

const CONTRADICTION_REQUEST: &str = r#"Provide:
1. Contradiction Level (low/medium/high)
2. Confidence Score (0.0-1.0)
3. Conflicting Sources (if any, or "None identified")
4. Reasoning

Format:
CONTRADICTION_LEVEL: [low/medium/high]
CONFIDENCE: [score]
CONFLICTING_SOURCES: [list or "None identified"]
REASONING: [explanation]"#;

/// User prompt for answer generation.
pub fn answer_prompt(query: &str, context: &str) -> String {
    format!(
        "Query: {}\n\nSources:\n{}\n\nProvide a concise answer following the format above. Cite everything.\n\nAnswer:",
        query, context
    )
}

/// System prompt for an evaluator.
pub fn evaluator_system_prompt(kind: EvaluatorKind) -> &'static str {
    match kind {
        EvaluatorKind::Clinical => CLINICAL_SYSTEM_PROMPT,
        EvaluatorKind::Statistical => STATISTICAL_SYSTEM_PROMPT,
        EvaluatorKind::Contradiction => CONTRADICTION_SYSTEM_PROMPT,
    }
}

/// User prompt asking an evaluator to assess `answer` against its sources.
pub fn evaluator_prompt(kind: EvaluatorKind, answer: &str, evidence: &[Evidence]) -> String {
    let (lead, request) = match kind {
        EvaluatorKind::Clinical => (
            "Evaluate this medical answer from a clinical perspective:",
            CLINICAL_REQUEST,
        ),
        EvaluatorKind::Statistical => (
            "Evaluate the statistical quality of this medical answer:",
            STATISTICAL_REQUEST,
        ),
        EvaluatorKind::Contradiction => (
            "Analyze potential contradictions in this medical information:",
            CONTRADICTION_REQUEST,
        ),
    };

    format!(
        "{}\n\nAnswer: {}\n\nSources:\n{}\n\n{}",
        lead,
        answer,
        source_summary(evidence),
        request
    )
}

/// Bullet list of the first few evidence titles.
pub fn source_summary(evidence: &[Evidence]) -> String {
    evidence
        .iter()
        .take(EVALUATOR_SOURCE_LIMIT)
        .map(|e| format!("- {}", e.title.chars().take(TITLE_CHARS).collect::<String>()))
        .collect::<Vec<_>>()
        .join("\n")
}
