//! Hybrid score fusion of lexical and semantic candidates.
//!
//! ```text
//! fused = 0.7 * (bm25 / max_bm25) + 0.3 * max(0, 1 - distance)
//! ```
//!
//! A document missing from one result set contributes `0.0` for that term.
//! Candidates below [`ACCEPTANCE_THRESHOLD`] are dropped, the rest are sorted
//! by descending fused score (ties by ascending id) and truncated to `top_k`.

use std::collections::BTreeMap;

use tracing::{debug, info, instrument};

use crate::clamp_unit;
use crate::lexical::LexicalHit;
use crate::types::{paper_id_of, title_from_paper_id, Evidence, Metadata, SemanticHit};

pub const LEXICAL_WEIGHT: f64 = 0.7;
pub const SEMANTIC_WEIGHT: f64 = 0.3;
pub const ACCEPTANCE_THRESHOLD: f64 = 0.3;

const DEFAULT_EXCERPT_CHARS: usize = 500;
const ELLIPSIS: &str = "...";

#[derive(Debug, Default, Clone, Copy)]
struct ScorePair {
    lexical: f64,
    semantic: f64,
}

/// Where a fused candidate's title/origin/text is resolved from.
struct SourceRecord<'a> {
    metadata: &'a Metadata,
    text: &'a str,
}

/// Merges lexical and semantic result sets into one ranked, thresholded list.
#[derive(Debug, Clone)]
pub struct HybridCombiner {
    excerpt_chars: usize,
}

impl HybridCombiner {
    pub fn new() -> Self {
        Self {
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }

    /// Override the excerpt length (in characters).
    pub fn with_excerpt_chars(mut self, excerpt_chars: usize) -> Self {
        self.excerpt_chars = excerpt_chars;
        self
    }

    /// Fuse both candidate lists into at most `top_k` evidence items.
    ///
    /// Returns an empty list when both inputs are empty.
    #[instrument(
        skip(self, lexical, semantic),
        fields(lexical_count = lexical.len(), semantic_count = semantic.len())
    )]
    pub fn combine(&self, lexical: &[LexicalHit], semantic: &[SemanticHit], top_k: usize) -> Vec<Evidence> {
        let max_lexical = lexical
            .iter()
            .map(|hit| hit.score)
            .filter(|score| score.is_finite() && *score > 0.0)
            .fold(0.0f64, f64::max);
        let normalizer = if max_lexical > 0.0 { max_lexical } else { 1.0 };

        let mut pairs: BTreeMap<&str, ScorePair> = BTreeMap::new();
        let mut lexical_records: BTreeMap<&str, SourceRecord<'_>> = BTreeMap::new();
        let mut semantic_records: BTreeMap<&str, SourceRecord<'_>> = BTreeMap::new();

        for hit in lexical {
            if !(hit.score.is_finite() && hit.score > 0.0) {
                continue;
            }
            let id = hit.document.id.as_str();
            pairs.entry(id).or_default().lexical = hit.score / normalizer;
            lexical_records.insert(
                id,
                SourceRecord {
                    metadata: &hit.document.metadata,
                    text: &hit.document.text,
                },
            );
        }

        for hit in semantic {
            let id = hit.id.as_str();
            pairs.entry(id).or_default().semantic = distance_to_similarity(hit.distance);
            semantic_records.insert(
                id,
                SourceRecord {
                    metadata: &hit.metadata,
                    text: &hit.document,
                },
            );
        }

        let candidate_count = pairs.len();
        let mut fused: Vec<(&str, f64)> = pairs
            .into_iter()
            .map(|(id, pair)| {
                let score = LEXICAL_WEIGHT.mul_add(pair.lexical, SEMANTIC_WEIGHT * pair.semantic);
                (id, clamp_unit(score))
            })
            .filter(|(_, score)| *score >= ACCEPTANCE_THRESHOLD)
            .collect();

        fused.sort_by(|(left_id, left), (right_id, right)| {
            right.total_cmp(left).then_with(|| left_id.cmp(right_id))
        });
        fused.truncate(top_k);

        info!(
            accepted = fused.len(),
            candidates = candidate_count,
            threshold = ACCEPTANCE_THRESHOLD,
            "Hybrid fusion complete"
        );

        fused
            .into_iter()
            .filter_map(|(id, score)| {
                // Semantic payload wins when a document is in both sets
                let record = semantic_records.get(id).or_else(|| lexical_records.get(id))?;
                Some(self.build_evidence(id, score, record))
            })
            .collect()
    }

    fn build_evidence(&self, id: &str, score: f64, record: &SourceRecord<'_>) -> Evidence {
        let paper_id = paper_id_of(id).to_string();
        let title = record
            .metadata
            .get("title")
            .and_then(|v| v.as_str())
            .filter(|t| !t.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| title_from_paper_id(&paper_id));
        let origin = record
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();

        debug!(id, score, "Evidence accepted");

        Evidence {
            id: id.to_string(),
            paper_id,
            title,
            relevance_score: score,
            excerpt: truncate_excerpt(record.text, self.excerpt_chars),
            origin,
            metadata: record.metadata.clone(),
        }
    }
}

impl Default for HybridCombiner {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert an index distance into a similarity in `[0, 1]`.
pub fn distance_to_similarity(distance: f64) -> f64 {
    clamp_unit(1.0 - distance)
}

/// Keep the first `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}
