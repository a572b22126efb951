//! Single-text embedding with response validation.

use std::sync::Arc;

use tracing::debug;

use pubrag_core::{EmbeddingBackend, Error, Result, Vector};

/// Embeds one text at a time and rejects malformed vectors.
///
/// Used for both cache writes (abstracts) and cache lookups (queries), so
/// everything stored and everything searched has passed the same checks.
#[derive(Clone)]
pub struct EmbeddingClient {
    backend: Arc<dyn EmbeddingBackend>,
}

impl EmbeddingClient {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    /// Dimension every returned vector is checked against.
    pub fn dimension(&self) -> usize {
        self.backend.dimension()
    }

    /// Embed a single non-blank text.
    ///
    /// # Errors
    ///
    /// - [`Error::Embedding`] for blank input, an empty response, a vector of
    ///   the wrong length, non-finite components, or any backend failure other
    ///   than an unreachable service.
    /// - [`Error::BackendUnavailable`] when the service cannot be reached.
    pub async fn embed(&self, text: &str) -> Result<Vector> {
        if text.trim().is_empty() {
            return Err(Error::Embedding("cannot embed blank text".to_string()));
        }

        let vectors = self
            .backend
            .embed_texts(&[text.to_string()])
            .await
            .map_err(|e| match e {
                Error::BackendUnavailable(_) | Error::Embedding(_) => e,
                other => Error::Embedding(other.to_string()),
            })?;

        let vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("backend returned no vectors".to_string()))?;

        let expected = self.backend.dimension();
        let values = vector.as_slice();
        if values.len() != expected {
            return Err(Error::Embedding(format!(
                "expected {} dimensions, got {}",
                expected,
                values.len()
            )));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(Error::Embedding(
                "vector contains non-finite values".to_string(),
            ));
        }

        debug!(
            subsystem = "inference",
            component = "embedding",
            text_len = text.len(),
            dimension = expected,
            "Embedded text"
        );
        Ok(vector)
    }
}
