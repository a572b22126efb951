//! Mock inference backend for deterministic testing.
//!
//! Provides a mock implementation of the embedding and generation traits
//! that produces deterministic embeddings and canned responses.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pubrag_inference::mock::MockInferenceBackend;
//! use pubrag_core::EmbeddingBackend;
//!
//! let backend = MockInferenceBackend::new()
//!     .with_dimension(64)
//!     .with_fixed_response("Test response");
//!
//! let vectors = backend.embed_texts(&["aspirin".to_string()]).await.unwrap();
//! assert_eq!(vectors[0].as_slice().len(), 64);
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pubrag_core::{
    EmbeddingBackend, Error, GenerationBackend, InferenceBackend, Result, Vector,
};

/// Mock inference backend for testing.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    dimension: usize,
    fixed_responses: HashMap<String, String>,
    failing_inputs: HashSet<String>,
    default_response: String,
    failure_rate: f64,
}

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
    /// System instructions for generation calls.
    pub system: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            fixed_responses: HashMap::new(),
            failing_inputs: HashSet::new(),
            default_response: "Mock response".to_string(),
            failure_rate: 0.0,
        }
    }
}

impl MockInferenceBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set a fixed response for generation requests.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Add a response mapping for a specific user prompt.
    pub fn with_response_mapping(
        mut self,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(input.into(), output.into());
        self
    }

    /// Fail every call whose input equals `input`.
    pub fn with_failing_input(mut self, input: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_inputs
            .insert(input.into());
        self
    }

    /// Set failure rate (0.0 - 1.0) for testing error handling.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        Arc::make_mut(&mut self.config).failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Get all logged calls for assertion.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.calls().clone()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.calls().clear()
    }

    /// Get number of embedded texts.
    pub fn embed_call_count(&self) -> usize {
        self.count_operation("embed")
    }

    /// Get number of generation calls.
    pub fn generate_call_count(&self) -> usize {
        self.count_operation("generate")
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Vec<MockCall>> {
        self.call_log.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn count_operation(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str, system: Option<&str>) {
        self.calls().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
            system: system.map(str::to_string),
        });
    }

    fn should_fail(&self, input: &str) -> bool {
        use rand::Rng;
        if self.config.failing_inputs.contains(input) {
            return true;
        }
        if self.config.failure_rate > 0.0 {
            rand::thread_rng().gen::<f64>() < self.config.failure_rate
        } else {
            false
        }
    }
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            self.log_call("embed", text, None);
            if self.should_fail(text) {
                return Err(Error::Embedding("Simulated failure for testing".to_string()));
            }
            vectors.push(Vector::from(mock_embedding(text, self.config.dimension)));
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        let system = (!system.is_empty()).then_some(system);
        self.log_call("generate", prompt, system);
        if self.should_fail(prompt) {
            return Err(Error::Inference("Simulated failure for testing".to_string()));
        }

        // Check for mapped response
        if let Some(response) = self.config.fixed_responses.get(prompt) {
            return Ok(response.clone());
        }

        Ok(self.config.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

#[async_trait]
impl InferenceBackend for MockInferenceBackend {
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Deterministic unit vector for `text`.
///
/// Each character bumps one component chosen from its code point and
/// position, so equal texts map to equal vectors and different texts
/// almost always differ.
pub fn mock_embedding(text: &str, dimension: usize) -> Vec<f32> {
    let mut vec = vec![0.0f32; dimension];
    if dimension == 0 {
        return vec;
    }

    for (i, c) in text.chars().enumerate() {
        vec[(c as usize + i) % dimension] += 0.1;
    }

    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vec.iter_mut().for_each(|x| *x /= norm);
    }
    vec
}
