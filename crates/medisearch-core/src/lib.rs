//! # medisearch-core
//!
//! Deterministic hybrid retrieval and confidence aggregation engine.
//!
//! This crate owns every step of the medical search pipeline that does not
//! touch the network:
//! - Lexical (BM25) indexing and query expansion
//! - Fusion of lexical and semantic candidates into one ranked evidence list
//! - Post-ranking evidence filters and length-bounded context assembly
//! - The answer gate that decides whether evidence is strong enough to answer
//! - Tolerant parsing of evaluator replies and weighted confidence aggregation
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: identical index snapshots and query yield an identical ranking
//! 2. **No I/O**: embedding, vector search, and generation live in `medisearch-runtime`
//! 3. **Bounded**: every relevance score and confidence is clamped to `[0, 1]`
//!
//! ## Example
//!
//! ```rust,ignore
//! use medisearch_core::{HybridCombiner, LexicalIndex};
//!
//! let index = LexicalIndex::build(corpus);
//! let lexical = index.search("statin efficacy in elderly", 100);
//! let evidence = HybridCombiner::new().combine(&lexical, &semantic_hits, 10);
//! ```

pub mod assessments;
pub mod combiner;
pub mod context;
pub mod expansion;
pub mod filter;
pub mod gate;
pub mod lexical;
pub mod reply;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use assessments::{
    Assessment, ClinicalValidation, ContradictionAnalysis, ContradictionLevel, EvaluatorKind,
    StatisticalValidation,
};
pub use combiner::{HybridCombiner, ACCEPTANCE_THRESHOLD, LEXICAL_WEIGHT, SEMANTIC_WEIGHT};
pub use context::{AssembledContext, ContextAssembler};
pub use expansion::QueryExpander;
pub use filter::apply_filters;
pub use gate::{AnswerGate, GateDecision, GATE_THRESHOLD};
pub use lexical::{tokenize, Bm25Params, LexicalHit, LexicalIndex};
pub use reply::{parse_reply, FieldDefault, FieldKind, FieldRule, ParsedReply, SOFT_PARSE_FLAG};
pub use types::{
    CorpusDocument, Evidence, Metadata, SearchFilters, SearchRequest, SemanticHit, SourceType,
    YearRange,
};
pub use validation::{AggregateValidation, ValidationScore};

use thiserror::Error;

/// Errors raised by the deterministic core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

/// Clamp a score into `[0, 1]`, mapping non-finite values to `0`.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
