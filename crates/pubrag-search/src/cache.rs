//! Semantic cache of article abstracts.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use pubrag_core::{ArticleRecord, CacheEntry, Result, RetrievedResult, Vector, VectorStore};
use pubrag_inference::EmbeddingClient;

/// Outcome of a cache write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheWriteReport {
    /// Entries written (inserted or replaced).
    pub stored: usize,
    /// Records skipped because their abstract is blank.
    pub skipped_empty: usize,
    /// Records skipped because their abstract could not be embedded.
    pub skipped_embedding: usize,
}

/// Abstracts stored with their embeddings for nearest-neighbor recall.
#[derive(Clone)]
pub struct SemanticCache {
    store: Arc<dyn VectorStore>,
    embedder: EmbeddingClient,
}

impl SemanticCache {
    pub fn new(store: Arc<dyn VectorStore>, embedder: EmbeddingClient) -> Self {
        Self { store, embedder }
    }

    pub fn embedder(&self) -> &EmbeddingClient {
        &self.embedder
    }

    /// Number of cached articles.
    pub async fn len(&self) -> Result<usize> {
        self.store.count().await
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Embed and store every record that has an abstract.
    ///
    /// Records with a blank abstract or whose abstract fails to embed are
    /// skipped; when an id repeats, the last record wins. Store errors are
    /// returned.
    pub async fn put(&self, records: &[ArticleRecord]) -> Result<CacheWriteReport> {
        let mut report = CacheWriteReport::default();
        let mut entries = Vec::new();

        for record in last_per_id(records) {
            if !record.is_cacheable() {
                report.skipped_empty += 1;
                debug!(
                    subsystem = "search",
                    component = "cache",
                    pmid = %record.id,
                    "Skipping record without abstract"
                );
                continue;
            }

            match self.embedder.embed(&record.abstract_text).await {
                Ok(embedding) => entries.push(CacheEntry::new(record, embedding)),
                Err(e) => {
                    report.skipped_embedding += 1;
                    warn!(
                        subsystem = "search",
                        component = "cache",
                        pmid = %record.id,
                        error = %e,
                        "Skipping record: abstract could not be embedded"
                    );
                }
            }
        }

        if entries.is_empty() {
            return Ok(report);
        }

        report.stored = entries.len();
        self.store.upsert(entries).await?;

        info!(
            subsystem = "search",
            component = "cache",
            op = "put",
            stored = report.stored,
            skipped_empty = report.skipped_empty,
            skipped_embedding = report.skipped_embedding,
            "Cache updated"
        );
        Ok(report)
    }

    /// Up to `k` cached articles nearest to `embedding`, best first.
    pub async fn lookup(&self, embedding: &Vector, k: usize) -> Result<Vec<RetrievedResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let hits = self.store.query_nearest(embedding, k).await?;
        debug!(
            subsystem = "search",
            component = "cache",
            op = "lookup",
            k,
            result_count = hits.len(),
            "Cache lookup complete"
        );
        Ok(hits.into_iter().map(RetrievedResult::from).collect())
    }

    /// Embed `text`, then [`lookup`](Self::lookup).
    pub async fn lookup_text(&self, text: &str, k: usize) -> Result<Vec<RetrievedResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(text).await?;
        self.lookup(&embedding, k).await
    }
}

/// Keep only the last record for each id, in order of those last occurrences.
fn last_per_id(records: &[ArticleRecord]) -> impl Iterator<Item = &ArticleRecord> {
    let last: HashMap<&str, usize> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.as_str(), i))
        .collect();

    records
        .iter()
        .enumerate()
        .filter(move |(i, r)| last.get(r.id.as_str()) == Some(i))
        .map(|(_, r)| r)
}
