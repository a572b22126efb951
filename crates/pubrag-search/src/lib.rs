//! # pubrag-search
//!
//! Retrieval side of pubmed-rag.
//!
//! This crate provides:
//! - Semantic cache over any [`VectorStore`](pubrag_core::VectorStore)
//! - Markdown merging of live and cached articles
//! - Environment-driven pipeline configuration
//! - [`RagPipeline`], which answers a free-text question end to end

pub mod cache;
pub mod config;
pub mod merge;
pub mod pipeline;

pub use cache::{CacheWriteReport, SemanticCache};
pub use config::PipelineConfig;
pub use merge::{merge_results, render_card};
pub use pipeline::{RagAnswer, RagPipeline};
