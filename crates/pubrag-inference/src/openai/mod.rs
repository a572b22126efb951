//! OpenAI-compatible inference backend.
//!
//! Works with any endpoint that speaks the OpenAI `/embeddings` and
//! `/chat/completions` protocol (OpenAI, Azure OpenAI, Ollama's `/v1`,
//! vLLM, LocalAI, LM Studio).
//!
//! # Example
//!
//! ```rust,no_run
//! use pubrag_inference::openai::{OpenAIBackend, OpenAIConfig};
//! use pubrag_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OpenAIConfig {
//!         base_url: "http://localhost:11434/v1".to_string(),
//!         embed_model: "nomic-embed-text".to_string(),
//!         embed_dimension: 768,
//!         ..Default::default()
//!     };
//!     let backend = OpenAIBackend::new(config).unwrap();
//!
//!     let texts = vec!["GLP-1 receptor agonists".to_string()];
//!     let vectors = backend.embed_texts(&texts).await.unwrap();
//! }
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_pubrag_error, OpenAIErrorCode, RequestKind};
pub use types::*;
