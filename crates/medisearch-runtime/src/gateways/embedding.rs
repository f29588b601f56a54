//! Embedding gateway.
//!
//! [`Embedder`] turns query text into the vector handed to the semantic
//! index. `HttpEmbedder` (feature `openai-compat`) calls an OpenAI-compatible
//! `/embeddings` endpoint.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the embedding service.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embedding service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed embedding response: {0}")]
    Malformed(String),

    #[error("Embedding service not configured: {0}")]
    NotConfigured(String),
}

/// Text embedding gateway.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed one query text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    async fn health_check(&self) -> bool;

    fn name(&self) -> &str;
}

#[cfg(feature = "openai-compat")]
pub use http::{HttpEmbedder, EMBEDDING_API_KEY_ENV};

#[cfg(feature = "openai-compat")]
mod http {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::{Embedder, EmbeddingError};
    use crate::config::EmbeddingConfig;
    use crate::providers::ApiCredential;

    /// Optional bearer token for the embedding endpoint.
    pub const EMBEDDING_API_KEY_ENV: &str = "EMBEDDING_API_KEY";

    /// OpenAI-compatible `/embeddings` client.
    pub struct HttpEmbedder {
        client: reqwest::Client,
        base_url: String,
        model: String,
        credential: Option<ApiCredential>,
    }

    impl std::fmt::Debug for HttpEmbedder {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("HttpEmbedder")
                .field("base_url", &self.base_url)
                .field("model", &self.model)
                .field("credential", &self.credential)
                .finish()
        }
    }

    impl HttpEmbedder {
        /// Build from config. The key comes from `api_key` or `EMBEDDING_API_KEY`
        /// and may be absent for local servers.
        pub fn from_config(
            config: &EmbeddingConfig,
            api_key: Option<&str>,
        ) -> Result<Self, EmbeddingError> {
            let client = reqwest::Client::builder()
                .timeout(config.timeout)
                .build()
                .map_err(|e| EmbeddingError::NotConfigured(e.to_string()))?;

            let credential = ApiCredential::lookup(api_key, EMBEDDING_API_KEY_ENV, "Embedding API key");

            Ok(Self {
                client,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                model: config.model.clone(),
                credential,
            })
        }

        fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
            match &self.credential {
                Some(credential) => request.bearer_auth(credential.expose()),
                None => request,
            }
        }
    }

    #[async_trait]
    impl Embedder for HttpEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let body = serde_json::json!({
                "model": self.model,
                "input": [text],
            });

            let response = self
                .authorize(self.client.post(format!("{}/embeddings", self.base_url)))
                .json(&body)
                .send()
                .await
                .map_err(|e| EmbeddingError::Request(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(EmbeddingError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let json: Value = response
                .json()
                .await
                .map_err(|e| EmbeddingError::Malformed(e.to_string()))?;

            parse_embedding_response(&json)?
                .into_iter()
                .next()
                .ok_or_else(|| EmbeddingError::Malformed("empty data array".to_string()))
        }

        async fn health_check(&self) -> bool {
            self.embed("health check").await.is_ok()
        }

        fn name(&self) -> &str {
            "http-embedder"
        }
    }

    /// Extract embeddings from `data[*].embedding`, ordered by `index`.
    pub(super) fn parse_embedding_response(json: &Value) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let data = json
            .get("data")
            .and_then(|v| v.as_array())
            .ok_or_else(|| EmbeddingError::Malformed("missing data array".to_string()))?;

        let mut indexed: Vec<(usize, Vec<f32>)> = Vec::with_capacity(data.len());
        for (fallback_index, item) in data.iter().enumerate() {
            let index = item
                .get("index")
                .and_then(|v| v.as_u64())
                .map(|v| v as usize)
                .unwrap_or(fallback_index);
            let values = item
                .get("embedding")
                .and_then(|v| v.as_array())
                .ok_or_else(|| EmbeddingError::Malformed("item missing embedding array".to_string()))?;

            let vector = values
                .iter()
                .map(|v| {
                    v.as_f64()
                        .map(|n| n as f32)
                        .ok_or_else(|| EmbeddingError::Malformed("non-numeric value".to_string()))
                })
                .collect::<Result<Vec<f32>, _>>()?;
            indexed.push((index, vector));
        }

        indexed.sort_by_key(|(index, _)| *index);
        Ok(indexed.into_iter().map(|(_, v)| v).collect())
    }
}
