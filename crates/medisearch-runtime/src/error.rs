use std::time::Duration;

use medisearch_core::CoreError;
use thiserror::Error;

use crate::gateways::{EmbeddingError, VectorStoreError};
use crate::providers::ProviderError;

/// Request-level errors returned by the search pipeline.
///
/// Degraded outcomes (no evidence, weak evidence, evaluator fallback) are
/// not errors; they are reported in [`SearchOutcome`](crate::SearchOutcome).
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[from] CoreError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    VectorStore(#[from] VectorStoreError),

    #[error("Answer generation failed: {0}")]
    Generation(#[from] ProviderError),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Pipeline not configured: {0}")]
    NotConfigured(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
