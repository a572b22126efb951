//! OpenAI-compatible inference backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use pubrag_core::{
    defaults, EmbeddingBackend, Error, GenerationBackend, InferenceBackend, Result, Vector,
};

use super::error::{to_pubrag_error, OpenAIErrorCode, RequestKind};
use super::types::*;

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model to use for embeddings.
    pub embed_model: String,
    /// Model to use for generation.
    pub gen_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            embed_model: defaults::EMBED_MODEL.to_string(),
            gen_model: defaults::GEN_MODEL.to_string(),
            embed_dimension: defaults::EMBED_DIMENSION,
            timeout_seconds: defaults::INFERENCE_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Read configuration from `OPENAI_*` environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-unparseable numeric
    /// values are configuration errors.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| defaults::OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            embed_model: std::env::var("OPENAI_EMBED_MODEL")
                .unwrap_or_else(|_| defaults::EMBED_MODEL.to_string()),
            gen_model: std::env::var("OPENAI_GEN_MODEL")
                .unwrap_or_else(|_| defaults::GEN_MODEL.to_string()),
            embed_dimension: parse_env("OPENAI_EMBED_DIM", defaults::EMBED_DIMENSION)?,
            timeout_seconds: parse_env("OPENAI_TIMEOUT", defaults::INFERENCE_TIMEOUT_SECS)?,
        })
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::Config(format!("{} has an invalid value: {:?}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// OpenAI-compatible inference backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            url = %config.base_url,
            embed_model = %config.embed_model,
            gen_model = %config.gen_model,
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(OpenAIConfig::default())
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env()?)
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.url(endpoint));

        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        req.header("Content-Type", "application/json")
    }

    /// Turn a non-success response into the matching error category.
    async fn error_from_response(response: reqwest::Response, kind: RequestKind) -> Error {
        let status = response.status();
        let (message, error_type) = match response.json::<OpenAIErrorResponse>().await {
            Ok(body) => (body.error.message, body.error.error_type.unwrap_or_default()),
            Err(_) => ("Unknown error".to_string(), String::new()),
        };
        let code = OpenAIErrorCode::from_response(status.as_u16(), &error_type);
        to_pubrag_error(code, kind, &format!("OpenAI returned {}: {}", status, message))
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAIBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(
            subsystem = "inference",
            component = "openai",
            op = "embed_texts",
            input_count = texts.len(),
            model = %self.config.embed_model,
            "Embedding texts"
        );

        let request = EmbeddingRequest {
            model: &self.config.embed_model,
            input: texts,
            encoding_format: "float",
        };

        let response = self
            .build_request("/embeddings")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, Error::Embedding))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, RequestKind::Embedding).await);
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("Failed to parse response: {}", e)))?;

        // Sort by index to ensure correct ordering
        let mut data = result.data;
        data.sort_by_key(|d| d.index);

        let vectors: Vec<Vector> = data
            .into_iter()
            .map(|d| Vector::from(d.embedding))
            .collect();

        debug!(result_count = vectors.len(), "Generated embeddings");
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl GenerationBackend for OpenAIBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_system("", prompt).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        debug!(
            subsystem = "inference",
            component = "openai",
            op = "generate",
            model = %self.config.gen_model,
            prompt_len = prompt.len(),
            "Requesting completion"
        );

        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt));

        let request = ChatCompletionRequest {
            model: &self.config.gen_model,
            messages,
            temperature: defaults::GEN_TEMPERATURE,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::from_transport(e, Error::Inference))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response, RequestKind::Completion).await);
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        debug!(response_len = content.len(), "Completion received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl InferenceBackend for OpenAIBackend {
    async fn health_check(&self) -> Result<bool> {
        let mut req = self
            .client
            .get(self.url("/models"))
            .timeout(Duration::from_secs(5));
        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => {
                info!(subsystem = "inference", component = "openai", "Health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!(
                    subsystem = "inference",
                    component = "openai",
                    status = %resp.status(),
                    "Health check failed"
                );
                Ok(false)
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "openai",
                    error = %e,
                    "Health check error"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenAIConfig::default();
        assert_eq!(config.base_url, defaults::OPENAI_URL);
        assert_eq!(config.embed_model, defaults::EMBED_MODEL);
        assert_eq!(config.gen_model, defaults::GEN_MODEL);
        assert_eq!(config.embed_dimension, defaults::EMBED_DIMENSION);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_backend_creation() {
        let backend = OpenAIBackend::with_defaults().unwrap();
        assert_eq!(backend.config().base_url, defaults::OPENAI_URL);
    }

    #[test]
    fn test_url_trims_trailing_slash() {
        let backend = OpenAIBackend::new(OpenAIConfig {
            base_url: "http://localhost:8080/v1/".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.url("/embeddings"), "http://localhost:8080/v1/embeddings");
    }

    #[test]
    fn test_dimension_accessor() {
        let config = OpenAIConfig {
            embed_dimension: 512,
            ..Default::default()
        };
        let backend = OpenAIBackend::new(config).unwrap();
        assert_eq!(backend.dimension(), 512);
    }

    #[test]
    fn test_model_name_accessor() {
        let config = OpenAIConfig {
            embed_model: "test-embed".to_string(),
            gen_model: "test-gen".to_string(),
            ..Default::default()
        };
        let backend = OpenAIBackend::new(config).unwrap();
        assert_eq!(EmbeddingBackend::model_name(&backend), "test-embed");
        assert_eq!(GenerationBackend::model_name(&backend), "test-gen");
    }

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: usize = parse_env("PUBRAG_TEST_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }
}
