//! Synthesis of a merged article corpus.

use std::sync::Arc;

use tracing::info;

use pubrag_core::{Error, GenerationBackend, Result};

/// Fixed role for the summarization request.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a biomedical research assistant writing for \
a medical audience. You are given a set of research articles, each introduced by its source, \
title, authors, journal and abstract. First, summarize each article in a few sentences, \
keeping its title as a heading and stating its main findings. Then write a 3-4 sentence \
synthesis of what the articles collectively show, noting where they agree or disagree. \
Use only the information in the articles.";

/// Produces the final answer from the merged corpus.
#[derive(Clone)]
pub struct Summarizer {
    backend: Arc<dyn GenerationBackend>,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Summarize `corpus` with a single completion request.
    pub async fn summarize(&self, corpus: &str) -> Result<String> {
        if corpus.trim().is_empty() {
            return Err(Error::InvalidInput(
                "nothing to summarize: corpus is empty".to_string(),
            ));
        }

        let start = std::time::Instant::now();
        let summary = self
            .backend
            .generate_with_system(SUMMARY_SYSTEM_PROMPT, corpus)
            .await?;

        if summary.trim().is_empty() {
            return Err(Error::Inference(
                "summarizer returned an empty response".to_string(),
            ));
        }

        info!(
            subsystem = "inference",
            component = "summarizer",
            op = "summarize",
            corpus_len = corpus.len(),
            summary_len = summary.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Corpus summarized"
        );
        Ok(summary)
    }
}
