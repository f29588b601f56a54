//! Semantic index seam: nearest-neighbor search plus a corpus snapshot.

use async_trait::async_trait;
use medisearch_core::{CorpusDocument, SemanticHit};
use thiserror::Error;

/// Errors from the semantic index.
#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// The store cannot be reached or opened at all
    #[error("Vector store unavailable: {0}")]
    Unavailable(String),

    /// A query against a reachable store failed
    #[error("Vector store query failed: {0}")]
    Query(String),
}

/// Read-only semantic index.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Number of stored documents.
    async fn count(&self) -> Result<usize, VectorStoreError>;

    /// Point-in-time copy of every stored document, used to build the lexical index.
    async fn snapshot(&self) -> Result<Vec<CorpusDocument>, VectorStoreError>;

    /// Up to `limit` documents closest to `embedding`, nearest first.
    async fn nearest(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SemanticHit>, VectorStoreError>;

    fn name(&self) -> &str;
}
