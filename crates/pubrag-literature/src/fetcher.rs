//! Search, fetch and normalize live literature records.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use pubrag_core::{defaults, ArticleRecord, Result};

use crate::normalize::normalize;
use crate::source::LiteratureSource;

/// Runs a structured query against a [`LiteratureSource`].
#[derive(Clone)]
pub struct LiteratureFetcher {
    source: Arc<dyn LiteratureSource>,
    concurrency: usize,
}

impl LiteratureFetcher {
    pub fn new(source: Arc<dyn LiteratureSource>) -> Self {
        Self {
            source,
            concurrency: defaults::FETCH_CONCURRENCY,
        }
    }

    /// Limit the number of records fetched at once (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Fetch up to `n` normalized records for `query`, in search order.
    ///
    /// A search failure is returned. A record that cannot be fetched or
    /// normalized is logged and left out.
    pub async fn fetch(&self, query: &str, n: usize) -> Result<Vec<ArticleRecord>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let start = std::time::Instant::now();
        let ids = unique_ids(self.source.search(query, n).await?, n);
        let requested = ids.len();

        let records: Vec<ArticleRecord> = stream::iter(ids)
            .map(|id| self.fetch_one(id))
            .buffered(self.concurrency)
            .filter_map(|r| async move { r })
            .collect()
            .await;

        info!(
            subsystem = "literature",
            component = "fetcher",
            op = "fetch",
            requested,
            result_count = records.len(),
            skipped = requested - records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Live records fetched"
        );
        Ok(records)
    }

    async fn fetch_one(&self, id: String) -> Option<ArticleRecord> {
        let result = match self.source.fetch(&id).await {
            Ok(raw) => normalize(&id, &raw),
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(
                    subsystem = "literature",
                    component = "fetcher",
                    pmid = %id,
                    error = %e,
                    "Skipping record"
                );
                None
            }
        }
    }
}

/// Drop blank and repeated ids, keeping first occurrences, and cap at `limit`.
fn unique_ids(ids: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty() && seen.insert(id.clone()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{RawArticle, RawPubmedArticle};
    use async_trait::async_trait;
    use pubrag_core::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory source; ids listed in `broken` fail to fetch.
    struct FakeSource {
        ids: Vec<String>,
        broken: Vec<String>,
        no_article: Vec<String>,
        search_fails: bool,
        searches: AtomicUsize,
        fetches: AtomicUsize,
    }

    impl FakeSource {
        fn new(ids: &[&str]) -> Self {
            Self {
                ids: ids.iter().map(|s| s.to_string()).collect(),
                broken: vec![],
                no_article: vec![],
                search_fails: false,
                searches: AtomicUsize::new(0),
                fetches: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LiteratureSource for FakeSource {
        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<String>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            if self.search_fails {
                return Err(Error::BackendUnavailable("esearch down".to_string()));
            }
            Ok(self.ids.iter().take(limit).cloned().collect())
        }

        async fn fetch(&self, id: &str) -> Result<RawPubmedArticle> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.broken.iter().any(|b| b == id) {
                return Err(Error::Fetch(format!("PMID {}: malformed XML", id)));
            }
            let article = (!self.no_article.iter().any(|b| b == id)).then(|| RawArticle {
                title: Some(format!("Title {}", id)),
                abstract_segments: vec![format!("Abstract {}", id)],
                ..Default::default()
            });
            Ok(RawPubmedArticle {
                pmid: Some(id.to_string()),
                article,
                mesh_headings: vec![],
            })
        }
    }

    #[tokio::test]
    async fn test_fetch_in_search_order() {
        let source = Arc::new(FakeSource::new(&["5", "3", "9"]));
        let fetcher = LiteratureFetcher::new(source);

        let records = fetcher.fetch("q", 5).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["5", "3", "9"]);
        assert_eq!(records[1].title, "Title 3");
    }

    #[tokio::test]
    async fn test_zero_results_makes_no_calls() {
        let source = Arc::new(FakeSource::new(&["1"]));
        let fetcher = LiteratureFetcher::new(source.clone());

        assert!(fetcher.fetch("q", 0).await.unwrap().is_empty());
        assert_eq!(source.searches.load(Ordering::SeqCst), 0);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_batch() {
        let mut source = FakeSource::new(&["1", "2", "3", "4", "5"]);
        source.broken = vec!["3".to_string()];
        let fetcher = LiteratureFetcher::new(Arc::new(source));

        let records = fetcher.fetch("q", 5).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "4", "5"]);
    }

    #[tokio::test]
    async fn test_normalization_failure_skipped() {
        let mut source = FakeSource::new(&["1", "2"]);
        source.no_article = vec!["1".to_string()];
        let fetcher = LiteratureFetcher::new(Arc::new(source));

        let records = fetcher.fetch("q", 5).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "2");
    }

    #[tokio::test]
    async fn test_search_failure_propagates() {
        let mut source = FakeSource::new(&["1"]);
        source.search_fails = true;
        let fetcher = LiteratureFetcher::new(Arc::new(source));

        let err = fetcher.fetch("q", 5).await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
    }

    #[tokio::test]
    async fn test_duplicate_ids_fetched_once() {
        let source = Arc::new(FakeSource::new(&["7", "8", "7"]));
        let fetcher = LiteratureFetcher::new(source.clone()).with_concurrency(1);

        let records = fetcher.fetch("q", 5).await.unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "8"]);
        assert_eq!(source.fetches.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unique_ids() {
        let ids = vec!["1", " 2 ", "1", "", "3"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(unique_ids(ids, 2), vec!["1", "2"]);
    }

    #[test]
    fn test_concurrency_minimum() {
        let fetcher = LiteratureFetcher::new(Arc::new(FakeSource::new(&[]))).with_concurrency(0);
        assert_eq!(fetcher.concurrency(), 1);
    }
}
