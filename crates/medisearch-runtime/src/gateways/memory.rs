//! Brute-force in-memory vector store.

use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use medisearch_core::{CorpusDocument, Metadata, SemanticHit};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::vector_store::{VectorStore, VectorStoreError};

/// One corpus record with its precomputed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: String,

    pub text: String,

    #[serde(default)]
    pub metadata: Metadata,

    pub embedding: Vec<f32>,
}

/// Exact nearest-neighbor search by cosine distance (`1 - cos`).
///
/// Records whose embedding dimension differs from the query are skipped with
/// a warning. A query that matches no record's dimension is an error.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    records: Vec<StoredRecord>,
}

impl InMemoryVectorStore {
    pub fn new(records: Vec<StoredRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of records.
    pub fn from_json(json: &str) -> Result<Self, VectorStoreError> {
        let records: Vec<StoredRecord> = serde_json::from_str(json)
            .map_err(|e| VectorStoreError::Unavailable(format!("invalid corpus: {}", e)))?;
        Ok(Self::new(records))
    }

    /// Load a JSON array of records from disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, VectorStoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            VectorStoreError::Unavailable(format!("cannot read {}: {}", path.display(), e))
        })?;
        let store = Self::from_json(&content)?;
        info!(path = %path.display(), documents = store.records.len(), "Loaded corpus");
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn count(&self) -> Result<usize, VectorStoreError> {
        Ok(self.records.len())
    }

    async fn snapshot(&self) -> Result<Vec<CorpusDocument>, VectorStoreError> {
        Ok(self
            .records
            .iter()
            .map(|r| CorpusDocument {
                id: r.id.clone(),
                text: r.text.clone(),
                metadata: r.metadata.clone(),
            })
            .collect())
    }

    async fn nearest(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<SemanticHit>, VectorStoreError> {
        let mut scored = Vec::with_capacity(self.records.len());
        for record in &self.records {
            if record.embedding.len() != embedding.len() {
                warn!(
                    id = %record.id,
                    stored = record.embedding.len(),
                    query = embedding.len(),
                    "Skipping record with mismatched embedding dimension"
                );
                continue;
            }
            scored.push((cosine_distance(embedding, &record.embedding), record));
        }

        if scored.is_empty() && !self.records.is_empty() {
            return Err(VectorStoreError::Query(format!(
                "no stored embedding has the query dimension {}",
                embedding.len()
            )));
        }

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });

        Ok(scored
            .into_iter()
            .take(limit)
            .map(|(distance, record)| SemanticHit {
                id: record.id.clone(),
                distance,
                metadata: record.metadata.clone(),
                document: record.text.clone(),
            })
            .collect())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

/// `1 - cos(a, b)`; a zero vector is treated as orthogonal to everything.
fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn record(id: &str, embedding: Vec<f32>) -> StoredRecord {
        StoredRecord {
            id: id.to_string(),
            text: format!("text of {}", id),
            metadata: Metadata::new(),
            embedding,
        }
    }

    #[tokio::test]
    async fn test_nearest_orders_by_distance() {
        let store = InMemoryVectorStore::new(vec![
            record("far", vec![0.0, 1.0]),
            record("near", vec![1.0, 0.1]),
            record("exact", vec![2.0, 0.0]),
        ]);

        let hits = store.nearest(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "exact");
        assert!(hits[0].distance.abs() < 1e-9);
        assert_eq!(hits[1].id, "near");
        assert_eq!(hits[1].document, "text of near");
    }

    #[tokio::test]
    async fn test_mismatched_record_is_skipped() {
        let store = InMemoryVectorStore::new(vec![
            record("good", vec![1.0, 0.0]),
            record("stale", vec![1.0, 0.0, 0.0]),
            record("other", vec![0.0, 1.0]),
        ]);

        let hits = store.nearest(&[1.0, 0.0], 5).await.unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["good", "other"]);
    }

    #[tokio::test]
    async fn test_empty_store_has_no_hits() {
        let store = InMemoryVectorStore::default();
        assert!(store.nearest(&[1.0, 0.0], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_query_error() {
        let store = InMemoryVectorStore::new(vec![record("a", vec![1.0, 0.0, 0.0])]);
        let result = store.nearest(&[1.0, 0.0], 5).await;
        assert!(matches!(result, Err(VectorStoreError::Query(_))));
    }

    #[tokio::test]
    async fn test_json_loading_and_snapshot() {
        let store = InMemoryVectorStore::from_json(
            r#"[
                {"id": "pmid_1_chunk_0", "text": "Metformin lowers glucose.",
                 "metadata": {"title": "Metformin", "source": "pubmed"},
                 "embedding": [0.1, 0.2]},
                {"id": "pmid_2_chunk_0", "text": "Statins reduce LDL.", "embedding": [0.3, 0.4]}
            ]"#,
        )
        .unwrap();

        assert_eq!(store.count().await.unwrap(), 2);
        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot[0].id, "pmid_1_chunk_0");
        assert_eq!(snapshot[0].metadata["source"], "pubmed");
        assert!(snapshot[1].metadata.is_empty());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = InMemoryVectorStore::from_json_file("/nonexistent/medisearch/corpus.json");
        assert!(matches!(result, Err(VectorStoreError::Unavailable(_))));
    }

    #[test]
    fn test_zero_vector_distance() {
        assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
    }

    proptest! {
        #[test]
        fn prop_cosine_distance_in_range(
            pair in prop::collection::vec((-10.0f32..10.0, -10.0f32..10.0), 1..16),
        ) {
            let (a, b): (Vec<f32>, Vec<f32>) = pair.into_iter().unzip();
            let d = cosine_distance(&a, &b);
            prop_assert!((-1e-9..=2.0 + 1e-9).contains(&d));
        }
    }
}
