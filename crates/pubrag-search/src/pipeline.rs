//! End-to-end retrieval-augmented answer for one query.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use pubrag_core::{
    ArticleRecord, EmbeddingBackend, Error, GenerationBackend, Result, RetrievedResult,
    StructuredQuery, VectorStore,
};
use pubrag_inference::{EmbeddingClient, QueryTranslator, Summarizer};
use pubrag_literature::{LiteratureFetcher, LiteratureSource};

use crate::cache::{CacheWriteReport, SemanticCache};
use crate::config::PipelineConfig;
use crate::merge::merge_results;

/// Everything produced while answering a query.
#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub structured_query: StructuredQuery,
    /// Articles retrieved from the literature database for this query.
    pub live: Vec<RetrievedResult>,
    /// Articles recalled from the semantic cache before this run's update.
    pub cached: Vec<RetrievedResult>,
    /// Markdown cards handed to the summarizer.
    pub corpus: String,
    pub summary: String,
    pub cache_report: CacheWriteReport,
}

/// Wires translator, fetcher, cache and summarizer together.
#[derive(Clone)]
pub struct RagPipeline {
    translator: QueryTranslator,
    fetcher: LiteratureFetcher,
    cache: SemanticCache,
    summarizer: Summarizer,
    config: PipelineConfig,
}

impl RagPipeline {
    pub fn new(
        generation: Arc<dyn GenerationBackend>,
        embedding: Arc<dyn EmbeddingBackend>,
        source: Arc<dyn LiteratureSource>,
        store: Arc<dyn VectorStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            translator: QueryTranslator::with_default_range(
                generation.clone(),
                config.date_range.clone(),
            ),
            fetcher: LiteratureFetcher::new(source).with_concurrency(config.fetch_concurrency),
            cache: SemanticCache::new(store, EmbeddingClient::new(embedding)),
            summarizer: Summarizer::new(generation),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &SemanticCache {
        &self.cache
    }

    /// Answer `query` from live literature plus the semantic cache.
    ///
    /// Translation, live search and summarization failures abort the run.
    /// Cache failures are logged and the run continues without them. When
    /// neither source yields an article the result is [`Error::NotFound`].
    #[instrument(skip(self), fields(subsystem = "search", component = "pipeline"))]
    pub async fn run(&self, query: &str) -> Result<RagAnswer> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query is empty".to_string()));
        }
        let start = Instant::now();

        let (query_embedding, live_fetch) = tokio::join!(
            self.cache.embedder().embed(query),
            self.translate_and_fetch(query),
        );
        let (structured_query, records) = live_fetch?;

        let cached = match query_embedding {
            Ok(embedding) => match self.cache.lookup(&embedding, self.config.lookup_k).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(error = %e, "Cache lookup failed; continuing without cached articles");
                    Vec::new()
                }
            },
            Err(e) => {
                warn!(error = %e, "Query embedding failed; skipping cache lookup");
                Vec::new()
            }
        };

        let cache_report = match self.cache.put(&records).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Cache update failed");
                CacheWriteReport::default()
            }
        };

        let live: Vec<RetrievedResult> = records.iter().map(RetrievedResult::from).collect();
        if live.is_empty() && cached.is_empty() {
            return Err(Error::NotFound(format!(
                "no articles found for {:?}",
                structured_query.pubmed_query
            )));
        }

        let corpus = merge_results(&live, &cached);
        let summary = self.summarizer.summarize(&corpus).await?;

        info!(
            op = "run",
            live_count = live.len(),
            cached_count = cached.len(),
            stored = cache_report.stored,
            duration_ms = start.elapsed().as_millis() as u64,
            "Answer ready"
        );

        Ok(RagAnswer {
            structured_query,
            live,
            cached,
            corpus,
            summary,
            cache_report,
        })
    }

    async fn translate_and_fetch(
        &self,
        query: &str,
    ) -> Result<(StructuredQuery, Vec<ArticleRecord>)> {
        let structured = self.translator.translate(query).await?;
        let records = self
            .fetcher
            .fetch(&structured.pubmed_query, self.config.result_limit)
            .await?;
        Ok((structured, records))
    }
}
