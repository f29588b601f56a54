//! End-to-end search pipeline.
//!
//! One request flows through:
//! 1. Validation and query expansion
//! 2. Lexical and semantic retrieval, run concurrently
//! 3. Hybrid fusion and the answer gate
//! 4. For strong evidence only: filters, context assembly, answer
//!    generation, and evaluator validation
//!
//! Gated outcomes (no evidence, weak evidence) never call the generation
//! service.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use medisearch_core::gate::NO_EVIDENCE_MESSAGE;
use medisearch_core::{
    apply_filters, AggregateValidation, AnswerGate, ContextAssembler, Evidence, GateDecision,
    HybridCombiner, LexicalIndex, QueryExpander, SearchRequest,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::RuntimeConfig;
use crate::error::PipelineError;
use crate::gateways::{Embedder, VectorStore};
use crate::generator::AnswerGenerator;
use crate::health::{HealthReport, ServiceStatus};
use crate::orchestrator::ValidationOrchestrator;
use crate::providers::LlmProvider;
use crate::resilience::RetryingProvider;

/// How a search request was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    NoEvidence,
    WeakEvidence,
    Generated,
}

impl From<GateDecision> for OutcomeKind {
    fn from(decision: GateDecision) -> Self {
        match decision {
            GateDecision::NoEvidence => OutcomeKind::NoEvidence,
            GateDecision::WeakEvidence { .. } => OutcomeKind::WeakEvidence,
            GateDecision::Generate { .. } => OutcomeKind::Generated,
        }
    }
}

/// Result of one search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub query: String,

    /// Generated answer, or the gate message when generation was skipped
    pub answer: String,

    /// Cited evidence in rank order
    pub evidence: Vec<Evidence>,

    pub decision: OutcomeKind,

    /// Best fused score, absent when nothing survived fusion
    pub top_score: Option<f64>,

    /// Present only for generated answers
    pub validation: Option<AggregateValidation>,

    pub processing_time_ms: u64,

    pub completed_at: DateTime<Utc>,
}

impl SearchOutcome {
    fn new(
        query: &str,
        answer: String,
        evidence: Vec<Evidence>,
        decision: GateDecision,
        validation: Option<AggregateValidation>,
    ) -> Self {
        Self {
            query: query.to_string(),
            answer,
            evidence,
            decision: decision.into(),
            top_score: decision.top_score(),
            validation,
            processing_time_ms: 0,
            completed_at: Utc::now(),
        }
    }
}

/// Lexical index statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: usize,
    pub vocabulary_size: usize,
    pub average_length: f64,
}

/// The hybrid retrieval and answer pipeline.
///
/// Holds a lexical index built once from the vector store snapshot at
/// startup. The index is immutable and shared by concurrent requests.
pub struct SearchPipeline {
    config: RuntimeConfig,
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    provider: Arc<dyn LlmProvider>,
    index: Arc<LexicalIndex>,
    expander: QueryExpander,
    combiner: HybridCombiner,
    gate: AnswerGate,
    assembler: ContextAssembler,
    generator: AnswerGenerator,
    orchestrator: ValidationOrchestrator,
}

impl SearchPipeline {
    pub fn builder() -> SearchPipelineBuilder {
        SearchPipelineBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run one search request, bounded by `request_timeout`.
    #[instrument(skip_all, fields(query = %request.query, top_k = request.top_k))]
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, PipelineError> {
        request.validate()?;

        let started = Instant::now();
        let timeout = self.config.request_timeout;
        let mut outcome = tokio::time::timeout(timeout, self.run(request))
            .await
            .map_err(|_| PipelineError::Timeout(timeout))??;

        outcome.processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            decision = ?outcome.decision,
            evidence = outcome.evidence.len(),
            elapsed_ms = outcome.processing_time_ms,
            "Search complete"
        );
        Ok(outcome)
    }

    async fn run(&self, request: &SearchRequest) -> Result<SearchOutcome, PipelineError> {
        let query = request.query.trim();
        let ranked = self.retrieve(query, request.top_k).await?;

        let decision = self.gate.decide(&ranked);
        match decision {
            GateDecision::NoEvidence => Ok(SearchOutcome::new(
                query,
                NO_EVIDENCE_MESSAGE.to_string(),
                Vec::new(),
                decision,
                None,
            )),
            GateDecision::WeakEvidence { top_score } => Ok(SearchOutcome::new(
                query,
                AnswerGate::weak_evidence_message(top_score),
                AnswerGate::weak_evidence_preview(&ranked),
                decision,
                None,
            )),
            GateDecision::Generate { .. } => {
                let evidence = apply_filters(ranked, request.filters.as_ref());
                let context = self.assembler.assemble(&evidence);
                let answer = self.generator.generate(query, &context).await?;
                let validation = self.orchestrator.validate(&answer, &evidence).await;
                Ok(SearchOutcome::new(
                    query,
                    answer,
                    evidence,
                    decision,
                    Some(validation),
                ))
            }
        }
    }

    /// Lexical search on the raw query and semantic search on the expanded
    /// query, fused into at most `top_k` ranked items.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<Evidence>, PipelineError> {
        let expanded = self.expander.expand(query);
        let pool = self.config.retrieval.candidate_pool;

        let index = Arc::clone(&self.index);
        let lexical_query = query.to_string();
        let lexical = async move {
            tokio::task::spawn_blocking(move || index.search(&lexical_query, pool))
                .await
                .map_err(|e| PipelineError::Internal(format!("lexical search task failed: {}", e)))
        };

        let semantic = async {
            let embedding = self.embedder.embed(&expanded).await?;
            let hits = self.store.nearest(&embedding, pool).await?;
            Ok::<_, PipelineError>(hits)
        };

        let (lexical_hits, semantic_hits) = tokio::try_join!(lexical, semantic)?;
        debug!(
            lexical = lexical_hits.len(),
            semantic = semantic_hits.len(),
            expanded = expanded != query,
            "Candidates retrieved"
        );

        Ok(self.combiner.combine(&lexical_hits, &semantic_hits, top_k))
    }

    /// Probe every dependency concurrently.
    pub async fn health(&self) -> HealthReport {
        let (store, generation, embedding) = tokio::join!(
            self.store.count(),
            self.provider.health_check(),
            self.embedder.health_check(),
        );

        let vector_store = match store {
            Ok(0) => ServiceStatus::Unhealthy,
            Ok(_) => ServiceStatus::Healthy,
            Err(e) => ServiceStatus::Error(e.to_string()),
        };

        HealthReport::new(
            vector_store,
            ServiceStatus::from_check(generation),
            ServiceStatus::from_check(embedding),
        )
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.index.len(),
            vocabulary_size: self.index.vocabulary_size(),
            average_length: self.index.average_length(),
        }
    }
}

/// Builder for [`SearchPipeline`].
pub struct SearchPipelineBuilder {
    config: RuntimeConfig,
    store: Option<Arc<dyn VectorStore>>,
    embedder: Option<Arc<dyn Embedder>>,
    provider: Option<Arc<dyn LlmProvider>>,
    orchestrator: Option<ValidationOrchestrator>,
    expander: QueryExpander,
}

impl SearchPipelineBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            store: None,
            embedder: None,
            provider: None,
            orchestrator: None,
            expander: QueryExpander::new(),
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation provider. It is wrapped in the configured retry policy.
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Replace the default evaluator set.
    pub fn orchestrator(mut self, orchestrator: ValidationOrchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn expander(mut self, expander: QueryExpander) -> Self {
        self.expander = expander;
        self
    }

    /// Build the pipeline, snapshotting the store into a lexical index.
    ///
    /// Fails if the store cannot be reached. An empty store is accepted.
    pub async fn build(self) -> Result<SearchPipeline, PipelineError> {
        let store = self
            .store
            .ok_or_else(|| PipelineError::NotConfigured("No vector store set".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| PipelineError::NotConfigured("No embedder set".to_string()))?;
        let provider = self
            .provider
            .ok_or_else(|| PipelineError::NotConfigured("No provider set".to_string()))?;
        self.config
            .validate()
            .map_err(|e| PipelineError::NotConfigured(e.to_string()))?;

        let count = store.count().await?;
        if count == 0 {
            warn!(store = store.name(), "Vector store is empty, every search will find no evidence");
        }

        let corpus = store.snapshot().await?;
        let index = tokio::task::spawn_blocking(move || LexicalIndex::build(corpus))
            .await
            .map_err(|e| PipelineError::Internal(format!("index build task failed: {}", e)))?;
        info!(
            store = store.name(),
            documents = index.len(),
            vocabulary = index.vocabulary_size(),
            "Search pipeline ready"
        );

        let provider: Arc<dyn LlmProvider> =
            Arc::new(RetryingProvider::new(provider, self.config.retry.clone()));
        let orchestrator = match self.orchestrator {
            Some(orchestrator) => orchestrator,
            None => ValidationOrchestrator::new(Arc::clone(&provider), &self.config),
        };
        let generator =
            AnswerGenerator::new(Arc::clone(&provider), self.config.generation.answer_completion());

        Ok(SearchPipeline {
            store,
            embedder,
            provider,
            index: Arc::new(index),
            expander: self.expander,
            combiner: HybridCombiner::new().with_excerpt_chars(self.config.retrieval.excerpt_chars),
            gate: AnswerGate::new(),
            assembler: ContextAssembler::new(self.config.retrieval.max_context_words),
            generator,
            orchestrator,
            config: self.config,
        })
    }
}

impl Default for SearchPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateways::{EmbeddingError, InMemoryVectorStore, StoredRecord, VectorStoreError};
    use crate::health::HealthStatus;
    use crate::providers::{
        ChatMessage, CompletionConfig, CompletionResponse, ProviderError, TokenUsage,
    };
    use async_trait::async_trait;
    use medisearch_core::{ContradictionLevel, CorpusDocument, SearchFilters, SemanticHit, SourceType};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    const ANSWER: &str = "### Summary\nMetformin improves glycemic control [1].";

    /// Replies to each call according to its system prompt.
    #[derive(Default)]
    struct ScriptedProvider {
        calls: AtomicUsize,
        evaluator_calls: AtomicUsize,
        fail_answer: bool,
        fail_evaluators: bool,
        delay: Duration,
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(
            &self,
            messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;

            let system = messages.first().map(|m| m.content.as_str()).unwrap_or_default();
            let is_answer = system.contains("medical research assistant");
            if !is_answer {
                self.evaluator_calls.fetch_add(1, Ordering::SeqCst);
            }
            if (is_answer && self.fail_answer) || (!is_answer && self.fail_evaluators) {
                return Err(ProviderError::HttpError("connection reset".to_string()));
            }

            let content = if is_answer {
                ANSWER
            } else if system.contains("clinical") {
                "CLINICAL_RELEVANCE: 0.9\nCONFIDENCE: 0.8\nSAFETY_CONCERNS: None identified\nREASONING: Consistent with guidelines."
            } else if system.contains("biostatistics") {
                "STATISTICAL_SCORE: 0.7\nCONFIDENCE: 0.6\nMETHODOLOGY_NOTES: Small samples.\nREASONING: Adequate."
            } else {
                "CONTRADICTION_LEVEL: low\nCONFIDENCE: 0.9\nCONFLICTING_SOURCES: None\nREASONING: Sources agree."
            };

            Ok(CompletionResponse {
                content: content.to_string(),
                usage: TokenUsage::default(),
                model: "mock".to_string(),
                stop_reason: Some("stop".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            !self.fail_answer
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    /// Returns the same vector for every text.
    struct FixedEmbedder(Vec<f32>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(self.0.clone())
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl Embedder for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Err(EmbeddingError::Request("connection refused".to_string()))
        }

        async fn health_check(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    /// In-memory store that can be taken offline.
    struct SwitchableStore {
        inner: InMemoryVectorStore,
        online: AtomicBool,
    }

    impl SwitchableStore {
        fn check(&self) -> Result<(), VectorStoreError> {
            if self.online.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(VectorStoreError::Unavailable("connection refused".to_string()))
            }
        }
    }

    #[async_trait]
    impl VectorStore for SwitchableStore {
        async fn count(&self) -> Result<usize, VectorStoreError> {
            self.check()?;
            self.inner.count().await
        }

        async fn snapshot(&self) -> Result<Vec<CorpusDocument>, VectorStoreError> {
            self.check()?;
            self.inner.snapshot().await
        }

        async fn nearest(
            &self,
            embedding: &[f32],
            limit: usize,
        ) -> Result<Vec<SemanticHit>, VectorStoreError> {
            self.check()?;
            self.inner.nearest(embedding, limit).await
        }

        fn name(&self) -> &str {
            "switchable"
        }
    }

    fn record(id: &str, text: &str, title: &str, source: &str, date: &str, embedding: [f32; 2]) -> StoredRecord {
        let metadata = json!({
            "title": title,
            "source": source,
            "publication_date": date,
            "mesh_terms": ["Humans"],
        });
        StoredRecord {
            id: id.to_string(),
            text: text.to_string(),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
            embedding: embedding.to_vec(),
        }
    }

    fn corpus() -> InMemoryVectorStore {
        InMemoryVectorStore::new(vec![
            record(
                "pmid_1_chunk_0",
                "Metformin improves glycemic control in type 2 diabetes patients",
                "Metformin and glycemic control",
                "pubmed",
                "2019-03-01",
                [1.0, 0.0],
            ),
            record(
                "pmid_2_chunk_0",
                "Statin therapy reduces cardiovascular events in elderly adults",
                "Statins in older adults",
                "clinical_trial",
                "2015",
                [0.0, 1.0],
            ),
            record(
                "pmid_3_chunk_0",
                "Exercise programs lower blood pressure in hypertensive adults",
                "Exercise and blood pressure",
                "medline",
                "2021-07-15",
                [0.6, 0.8],
            ),
        ])
    }

    fn test_config() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.retry.min_delay = Duration::from_millis(1);
        config.retry.max_delay = Duration::from_millis(2);
        config
    }

    async fn pipeline_with(
        provider: Arc<ScriptedProvider>,
        embedder: Arc<dyn Embedder>,
        config: RuntimeConfig,
    ) -> SearchPipeline {
        SearchPipeline::builder()
            .config(config)
            .vector_store(Arc::new(corpus()))
            .embedder(embedder)
            .provider(provider)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_strong_match_generates_validated_answer() {
        let provider = Arc::new(ScriptedProvider::default());
        let pipeline = pipeline_with(
            provider.clone(),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            test_config(),
        )
        .await;

        let outcome = pipeline
            .search(&SearchRequest::new("metformin glycemic control"))
            .await
            .unwrap();

        assert_eq!(outcome.decision, OutcomeKind::Generated);
        assert_eq!(outcome.answer, ANSWER);
        assert_eq!(outcome.evidence.len(), 1);
        assert_eq!(outcome.evidence[0].id, "pmid_1_chunk_0");
        assert_eq!(outcome.evidence[0].paper_id, "pmid_1");
        assert_eq!(outcome.evidence[0].title, "Metformin and glycemic control");
        assert!((outcome.top_score.unwrap() - 1.0).abs() < 1e-9);

        let validation = outcome.validation.unwrap();
        assert!(!validation.is_fallback());
        assert!((validation.overall_confidence - 0.77).abs() < 1e-9);
        assert_eq!(validation.contradiction.level, ContradictionLevel::Low);
        assert!(validation.clinical.safety_concerns.is_empty());

        // One answer call plus one call per evaluator
        assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
        assert_eq!(provider.evaluator_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_weak_evidence_skips_generation() {
        let provider = Arc::new(ScriptedProvider::default());
        let pipeline = pipeline_with(
            provider.clone(),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            test_config(),
        )
        .await;

        let outcome = pipeline
            .search(&SearchRequest::new("zebrafish neurogenesis"))
            .await
            .unwrap();

        assert_eq!(outcome.decision, OutcomeKind::WeakEvidence);
        let top = outcome.top_score.unwrap();
        assert!((0.3..0.4).contains(&top), "top score {top}");
        assert!(outcome.answer.starts_with("No highly relevant sources found. Best match: 0.30"));
        assert_eq!(outcome.evidence.len(), 1);
        assert!(outcome.validation.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_evidence_returns_fixed_message() {
        let provider = Arc::new(ScriptedProvider::default());
        let pipeline = pipeline_with(
            provider.clone(),
            Arc::new(FixedEmbedder(vec![0.0, -1.0])),
            test_config(),
        )
        .await;

        let outcome = pipeline
            .search(&SearchRequest::new("zebrafish neurogenesis"))
            .await
            .unwrap();

        assert_eq!(outcome.decision, OutcomeKind::NoEvidence);
        assert_eq!(outcome.answer, NO_EVIDENCE_MESSAGE);
        assert!(outcome.evidence.is_empty());
        assert!(outcome.top_score.is_none());
        assert!(outcome.validation.is_none());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_filters_apply_after_gate() {
        let provider = Arc::new(ScriptedProvider::default());
        let pipeline = pipeline_with(
            provider.clone(),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            test_config(),
        )
        .await;

        let filters = SearchFilters {
            source_types: vec![SourceType::Medline],
            ..Default::default()
        };
        let request = SearchRequest::new("metformin glycemic control").with_filters(filters);
        let outcome = pipeline.search(&request).await.unwrap();

        // The gate saw the unfiltered top score, the filter then removed it
        assert_eq!(outcome.decision, OutcomeKind::Generated);
        assert!(outcome.evidence.is_empty());
        assert!(outcome.validation.is_some());
    }

    #[tokio::test]
    async fn test_evaluator_failure_keeps_answer_with_fallback() {
        let provider = Arc::new(ScriptedProvider {
            fail_evaluators: true,
            ..Default::default()
        });
        let pipeline = pipeline_with(
            provider.clone(),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            test_config(),
        )
        .await;

        let outcome = pipeline
            .search(&SearchRequest::new("metformin glycemic control"))
            .await
            .unwrap();

        assert_eq!(outcome.answer, ANSWER);
        let validation = outcome.validation.unwrap();
        assert!(validation.is_fallback());
        assert!((validation.overall_confidence - 0.5).abs() < 1e-9);
        assert_eq!(validation.contradiction.level, ContradictionLevel::Unknown);
    }

    #[tokio::test]
    async fn test_generation_failure_is_retried_then_surfaced() {
        let provider = Arc::new(ScriptedProvider {
            fail_answer: true,
            ..Default::default()
        });
        let pipeline = pipeline_with(
            provider.clone(),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            test_config(),
        )
        .await;

        let err = pipeline
            .search(&SearchRequest::new("metformin glycemic control"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Generation(ProviderError::HttpError(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(provider.evaluator_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_is_surfaced() {
        let provider = Arc::new(ScriptedProvider::default());
        let pipeline = pipeline_with(provider.clone(), Arc::new(BrokenEmbedder), test_config()).await;

        let err = pipeline
            .search(&SearchRequest::new("metformin glycemic control"))
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Embedding(_)));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_makes_no_calls() {
        let provider = Arc::new(ScriptedProvider::default());
        let pipeline = pipeline_with(
            provider.clone(),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            test_config(),
        )
        .await;

        let short = pipeline.search(&SearchRequest::new("hi")).await.unwrap_err();
        assert!(matches!(short, PipelineError::InvalidRequest(_)));

        let too_many = SearchRequest::new("metformin").with_top_k(51);
        assert!(matches!(
            pipeline.search(&too_many).await,
            Err(PipelineError::InvalidRequest(_))
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout() {
        let provider = Arc::new(ScriptedProvider {
            delay: Duration::from_secs(10),
            ..Default::default()
        });
        let mut config = test_config();
        config.generation.call_timeout = Duration::from_millis(100);
        config.evaluator_timeout = Duration::from_millis(500);
        config.request_timeout = Duration::from_secs(1);
        let pipeline =
            pipeline_with(provider, Arc::new(FixedEmbedder(vec![1.0, 0.0])), config).await;

        let err = pipeline
            .search(&SearchRequest::new("metformin glycemic control"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Timeout(d) if d == Duration::from_secs(1)));
    }

    #[tokio::test]
    async fn test_unreachable_store_fails_startup() {
        let store = Arc::new(SwitchableStore {
            inner: corpus(),
            online: AtomicBool::new(false),
        });
        let result = SearchPipeline::builder()
            .config(test_config())
            .vector_store(store)
            .embedder(Arc::new(FixedEmbedder(vec![1.0, 0.0])))
            .provider(Arc::new(ScriptedProvider::default()))
            .build()
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::VectorStore(VectorStoreError::Unavailable(_)))
        ));
    }

    #[tokio::test]
    async fn test_missing_dependency_is_not_configured() {
        let result = SearchPipeline::builder()
            .vector_store(Arc::new(corpus()))
            .provider(Arc::new(ScriptedProvider::default()))
            .build()
            .await;
        assert!(matches!(result, Err(PipelineError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_health_reflects_dependencies() {
        let store = Arc::new(SwitchableStore {
            inner: corpus(),
            online: AtomicBool::new(true),
        });
        let pipeline = SearchPipeline::builder()
            .config(test_config())
            .vector_store(store.clone())
            .embedder(Arc::new(FixedEmbedder(vec![1.0, 0.0])))
            .provider(Arc::new(ScriptedProvider::default()))
            .build()
            .await
            .unwrap();

        assert_eq!(pipeline.health().await.status, HealthStatus::Healthy);

        store.online.store(false, Ordering::SeqCst);
        let report = pipeline.health().await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
        assert!(matches!(
            report.services.get("vector_store"),
            Some(ServiceStatus::Error(_))
        ));
    }

    #[tokio::test]
    async fn test_empty_store_is_degraded_but_searchable() {
        let pipeline = SearchPipeline::builder()
            .config(test_config())
            .vector_store(Arc::new(InMemoryVectorStore::default()))
            .embedder(Arc::new(FixedEmbedder(vec![1.0, 0.0])))
            .provider(Arc::new(ScriptedProvider::default()))
            .build()
            .await
            .unwrap();

        assert_eq!(pipeline.stats().documents, 0);
        assert_eq!(pipeline.health().await.status, HealthStatus::Degraded);

        let outcome = pipeline
            .search(&SearchRequest::new("metformin glycemic control"))
            .await
            .unwrap();
        assert_eq!(outcome.decision, OutcomeKind::NoEvidence);
    }

    #[tokio::test]
    async fn test_stats_and_serialized_outcome() {
        let pipeline = pipeline_with(
            Arc::new(ScriptedProvider::default()),
            Arc::new(FixedEmbedder(vec![1.0, 0.0])),
            test_config(),
        )
        .await;

        let stats = pipeline.stats();
        assert_eq!(stats.documents, 3);
        assert!(stats.vocabulary_size > 10);
        assert!(stats.average_length > 0.0);

        let outcome = pipeline
            .search(&SearchRequest::new("zebrafish neurogenesis"))
            .await
            .unwrap();
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["decision"], "weak_evidence");
        assert!(json["validation"].is_null());
        assert_eq!(json["evidence"][0]["origin"], "pubmed");
    }
}
