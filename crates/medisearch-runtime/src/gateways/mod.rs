//! Gateways to the external retrieval services.
//!
//! - [`Embedder`]: turns the expanded query into a vector
//! - [`VectorStore`]: nearest-neighbor search plus the corpus snapshot the
//!   lexical index is built from

mod embedding;
mod memory;
mod vector_store;

pub use embedding::{Embedder, EmbeddingError};
pub use memory::{InMemoryVectorStore, StoredRecord};
pub use vector_store::{VectorStore, VectorStoreError};

#[cfg(feature = "openai-compat")]
pub use embedding::{HttpEmbedder, EMBEDDING_API_KEY_ENV};
