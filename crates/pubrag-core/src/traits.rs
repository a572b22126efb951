//! Core traits for pubmed-rag abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{CacheEntry, CacheHit, Vector};

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate text with system context.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Combined inference backend supporting both embedding and generation.
#[async_trait]
pub trait InferenceBackend: EmbeddingBackend + GenerationBackend {
    /// Check if the backend is available and responding.
    async fn health_check(&self) -> Result<bool>;
}

// =============================================================================
// VECTOR STORE TRAITS
// =============================================================================

/// Persistent key/vector store backing the semantic cache.
///
/// Entries are keyed by article id; writing an id that already exists
/// replaces the stored entry.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or overwrite entries by id.
    async fn upsert(&self, entries: Vec<CacheEntry>) -> Result<()>;

    /// Return up to `k` entries closest to `embedding`, best match first.
    async fn query_nearest(&self, embedding: &Vector, k: usize) -> Result<Vec<CacheHit>>;

    /// Number of stored entries.
    async fn count(&self) -> Result<usize>;

    /// Embedding dimension this store accepts.
    fn dimension(&self) -> usize;
}
