//! OpenAI-specific error handling.

use pubrag_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }
}

/// Which kind of request failed; decides the error category for
/// failures that are not configuration problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Embedding,
    Completion,
}

/// Convert an OpenAI error response to a pubmed-rag Error.
pub fn to_pubrag_error(code: OpenAIErrorCode, kind: RequestKind, message: &str) -> Error {
    let failed = |msg: String| match kind {
        RequestKind::Embedding => Error::Embedding(msg),
        RequestKind::Completion => Error::Inference(msg),
    };

    match code {
        OpenAIErrorCode::AuthenticationError => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        OpenAIErrorCode::ModelNotFound => Error::Config(format!("Model not found: {}", message)),
        OpenAIErrorCode::RateLimitExceeded => failed(format!("Rate limit exceeded: {}", message)),
        OpenAIErrorCode::ContextLengthExceeded => failed(format!("Context too long: {}", message)),
        OpenAIErrorCode::ServerError => {
            Error::BackendUnavailable(format!("Server error: {}", message))
        }
        OpenAIErrorCode::Unknown => failed(message.to_string()),
    }
}
