//! Non-persistent vector store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use pubrag_core::{CacheEntry, CacheHit, Result, Vector, VectorStore};

use crate::check_dimension;

/// Cosine similarity of two equal-length vectors; `0.0` if either is zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// In-process [`VectorStore`] with brute-force cosine search.
///
/// Used when no database is configured and in tests. Contents are lost when
/// the process exits.
pub struct InMemoryVectorStore {
    entries: RwLock<HashMap<String, CacheEntry>>,
    dimension: usize,
}

impl InMemoryVectorStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dimension,
        }
    }

    /// Clone of the stored entry for `id`.
    pub async fn get(&self, id: &str) -> Option<CacheEntry> {
        self.entries.read().await.get(id).cloned()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, entries: Vec<CacheEntry>) -> Result<()> {
        // Validate the whole batch before writing any of it
        for entry in &entries {
            check_dimension(&entry.embedding, self.dimension)?;
        }

        let mut store = self.entries.write().await;
        for entry in entries {
            store.insert(entry.id.clone(), entry);
        }
        Ok(())
    }

    async fn query_nearest(&self, embedding: &Vector, k: usize) -> Result<Vec<CacheHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        check_dimension(embedding, self.dimension)?;

        let store = self.entries.read().await;
        let mut hits: Vec<CacheHit> = store
            .values()
            .map(|entry| CacheHit {
                id: entry.id.clone(),
                document_text: entry.document_text.clone(),
                metadata: entry.metadata.clone(),
                score: cosine_similarity(embedding.as_slice(), entry.embedding.as_slice()),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(k);
        Ok(hits)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.entries.read().await.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
