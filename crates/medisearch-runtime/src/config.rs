//! Runtime configuration.
//!
//! Loaded from YAML. Every section and field is optional and falls back to
//! the defaults below. Durations are human-readable strings ("2s", "150ms").
//!
//! ```yaml
//! retrieval:
//!   default_top_k: 10
//!   candidate_pool: 100
//! generation:
//!   model: llama-3.1-8b-instant
//!   call_timeout: 30s
//! retry:
//!   max_attempts: 3
//!   min_delay: 2s
//!   max_delay: 10s
//! request_timeout: 4m
//! evaluator_timeout: 100s
//! ```
//!
//! `evaluator_timeout` must cover a full retry chain of one generation call,
//! and `request_timeout` must cover answer generation plus validation.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::providers::CompletionConfig;

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub retrieval: RetrievalConfig,

    pub generation: GenerationConfig,

    pub embedding: EmbeddingConfig,

    pub retry: RetryConfig,

    /// Upper bound on one search request, end to end
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,

    /// Upper bound on one evaluator call, retries included
    #[serde(with = "humantime_duration")]
    pub evaluator_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retrieval: RetrievalConfig::default(),
            generation: GenerationConfig::default(),
            embedding: EmbeddingConfig::default(),
            retry: RetryConfig::default(),
            request_timeout: Duration::from_secs(240),
            evaluator_timeout: Duration::from_secs(100),
        }
    }
}

impl RuntimeConfig {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.candidate_pool == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.candidate_pool must be positive".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.min_delay > self.retry.max_delay {
            return Err(ConfigError::Invalid(
                "retry.min_delay must not exceed retry.max_delay".to_string(),
            ));
        }

        let retry_budget = self.retry.worst_case(self.generation.call_timeout);
        if self.evaluator_timeout < retry_budget {
            return Err(ConfigError::Invalid(format!(
                "evaluator_timeout ({}) is shorter than one retried generation call ({})",
                humantime::format_duration(self.evaluator_timeout),
                humantime::format_duration(retry_budget)
            )));
        }
        let pipeline_budget = retry_budget + self.evaluator_timeout;
        if self.request_timeout < pipeline_budget {
            return Err(ConfigError::Invalid(format!(
                "request_timeout ({}) is shorter than answer generation plus validation ({})",
                humantime::format_duration(self.request_timeout),
                humantime::format_duration(pipeline_budget)
            )));
        }
        Ok(())
    }
}

/// Retrieval and context sizing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// `top_k` used when a request does not specify one
    pub default_top_k: usize,

    /// Candidates requested from each index before fusion
    pub candidate_pool: usize,

    /// Word budget of the generation context
    pub max_context_words: usize,

    /// Evidence excerpt length in characters
    pub excerpt_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 10,
            candidate_pool: 100,
            max_context_words: 2048,
            excerpt_chars: 500,
        }
    }
}

/// Generation service settings shared by the answer generator and evaluators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,

    /// OpenAI-compatible API root
    pub base_url: String,

    pub answer_max_tokens: u32,

    pub answer_temperature: f32,

    pub evaluator_max_tokens: u32,

    pub evaluator_temperature: f32,

    /// Timeout of a single HTTP call
    #[serde(with = "humantime_duration")]
    pub call_timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            base_url: "https://api.groq.com/openai/v1".to_string(),
            answer_max_tokens: 700,
            answer_temperature: 0.3,
            evaluator_max_tokens: 400,
            evaluator_temperature: 0.3,
            call_timeout: Duration::from_secs(30),
        }
    }
}

impl GenerationConfig {
    /// Completion settings for answer generation.
    pub fn answer_completion(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.answer_max_tokens,
            temperature: self.answer_temperature,
            timeout: self.call_timeout,
        }
    }

    /// Completion settings for evaluator calls.
    pub fn evaluator_completion(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.evaluator_max_tokens,
            temperature: self.evaluator_temperature,
            timeout: self.call_timeout,
        }
    }
}

/// Embedding service settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,

    /// OpenAI-compatible API root serving `/embeddings`
    pub base_url: String,

    #[serde(with = "humantime_duration")]
    pub timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "microsoft/BiomedNLP-PubMedBERT-base-uncased-abstract".to_string(),
            base_url: "http://localhost:8080/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Bounded exponential backoff applied to every generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: usize,

    #[serde(with = "humantime_duration")]
    pub min_delay: Duration,

    #[serde(with = "humantime_duration")]
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Longest a retried call can take when every attempt runs to `call_timeout`.
    ///
    /// Backoff doubles from `min_delay` and is capped at `max_delay`.
    pub fn worst_case(&self, call_timeout: Duration) -> Duration {
        let attempts = self.max_attempts.max(1);
        let mut total = call_timeout.saturating_mul(attempts as u32);
        let mut delay = self.min_delay;
        for _ in 1..attempts {
            total = total.saturating_add(delay.min(self.max_delay));
            delay = delay.saturating_mul(2);
        }
        total
    }
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}
