//! # pubrag-inference
//!
//! LLM-backed steps of the pubmed-rag pipeline.
//!
//! This crate provides:
//! - OpenAI-compatible embedding and completion backend
//! - Embedding client with vector validation
//! - Query translator (free text to structured PubMed query)
//! - Summarizer for the merged article corpus
//! - Deterministic mock backend (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use pubrag_inference::{OpenAIBackend, QueryTranslator};
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = Arc::new(OpenAIBackend::from_env().unwrap());
//!     let translator = QueryTranslator::new(backend);
//!     let query = translator.translate("statins after stroke").await.unwrap();
//!     println!("{}", query.pubmed_query);
//! }
//! ```

pub mod embedding;
pub mod openai;
pub mod summarize;
pub mod translate;

// Mock inference backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use embedding::EmbeddingClient;
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use summarize::{Summarizer, SUMMARY_SYSTEM_PROMPT};
pub use translate::QueryTranslator;
