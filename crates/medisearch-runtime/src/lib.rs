//! # medisearch-runtime
//!
//! Async services around the deterministic `medisearch-core` engine.
//!
//! This crate owns everything that talks to the outside world:
//! - The embedding service and the vector store used for semantic search
//! - The generation service, reached through [`LlmProvider`] with bounded retry
//! - The three evaluator agents and the orchestrator that fans out to them
//! - The [`SearchPipeline`] tying retrieval, gating, generation, and
//!   validation into one request
//!
//! ## Failure Model
//!
//! - Weak or missing evidence is an outcome, not an error, and makes no
//!   generation calls
//! - An evaluator that fails or times out degrades validation to a fixed
//!   fallback; the generated answer is still returned
//! - Embedding, vector store, and answer generation failures fail the request
//!
//! ## Example
//!
//! ```rust,ignore
//! use medisearch_runtime::{InMemoryVectorStore, HttpEmbedder, OpenAiCompatProvider, RuntimeConfig, SearchPipeline};
//!
//! let config = RuntimeConfig::from_yaml_file("medisearch.yaml")?;
//! let pipeline = SearchPipeline::builder()
//!     .vector_store(Arc::new(InMemoryVectorStore::from_json_file("corpus.json")?))
//!     .embedder(Arc::new(HttpEmbedder::from_config(&config.embedding, None)?))
//!     .provider(Arc::new(OpenAiCompatProvider::from_config(&config.generation, None)?))
//!     .config(config)
//!     .build()
//!     .await?;
//!
//! let outcome = pipeline.search(&SearchRequest::new("statin efficacy in elderly")).await?;
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod gateways;
pub mod generator;
pub mod health;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod resilience;

pub use agents::{AgentError, EvaluatorAgent, LlmEvaluator};
pub use config::{ConfigError, RuntimeConfig};
pub use error::PipelineError;
pub use gateways::{Embedder, EmbeddingError, InMemoryVectorStore, StoredRecord, VectorStore, VectorStoreError};
pub use generator::AnswerGenerator;
pub use health::{HealthReport, HealthStatus, ServiceStatus};
pub use orchestrator::ValidationOrchestrator;
pub use pipeline::{IndexStats, OutcomeKind, SearchOutcome, SearchPipeline, SearchPipelineBuilder};
pub use providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError, Role};
pub use resilience::RetryingProvider;

#[cfg(feature = "openai-compat")]
pub use gateways::HttpEmbedder;
#[cfg(feature = "openai-compat")]
pub use providers::OpenAiCompatProvider;
