//! Generation service abstractions.
//!
//! Every call to the external generation service goes through
//! [`LlmProvider`]: the answer generator and each evaluator agent hold an
//! `Arc<dyn LlmProvider>`, normally a [`RetryingProvider`](crate::resilience::RetryingProvider)
//! wrapping a transport such as `OpenAiCompatProvider`.
//!
//! Transports read their keys through [`ApiCredential`] so a key never
//! reaches a log line.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub mod secrets;

#[cfg(feature = "openai-compat")]
mod openai_compat;

pub use secrets::{ApiCredential, CredentialSource};

#[cfg(feature = "openai-compat")]
pub use openai_compat::{OpenAiCompatProvider, GROQ_API_KEY_ENV};

/// Errors from the generation service.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limited by generation service (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("Generation service returned {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Unreadable completion: {0}")]
    ParseError(String),

    #[error("Generation service rejected the API key")]
    AuthError,

    #[error("Completion timed out after {0:?}")]
    Timeout(Duration),

    #[error("Generation service not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether another attempt could succeed.
    ///
    /// Authentication and configuration failures are permanent.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ProviderError::AuthError | ProviderError::NotConfigured(_))
    }
}

/// Sampling and limits for one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub model: String,

    pub max_tokens: u32,

    pub temperature: f32,

    /// Bound on a single HTTP call, retries excluded
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "llama-3.1-8b-instant".to_string(),
            max_tokens: 400,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Speaker of a chat message, serialized the way chat-completions APIs expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

/// A finished completion.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Raw generated text, untrimmed
    pub content: String,

    pub usage: TokenUsage,

    /// Model reported by the service, which may differ from the one requested
    pub model: String,

    /// `finish_reason` as reported, e.g. "stop" or "length"
    pub stop_reason: Option<String>,
}

impl CompletionResponse {
    /// Whether generation stopped at the token limit.
    pub fn truncated(&self) -> bool {
        self.stop_reason.as_deref() == Some("length")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A chat-completions backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run one completion. Implementations make exactly one attempt.
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    async fn health_check(&self) -> bool;

    /// Short name used in log fields.
    fn name(&self) -> &str;
}
