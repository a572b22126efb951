//! Error types for pubmed-rag.

use thiserror::Error;

/// Result type alias using pubmed-rag's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for pubmed-rag operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The completion backend returned something that is not a valid structured query
    #[error("Translation error: {0}")]
    Translation(String),

    /// Embedding generation failed or produced a malformed vector
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// A single literature record could not be fetched or parsed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// An external service could not be reached
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Inference/generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a batch operation may skip the failing item and continue.
    ///
    /// Embedding and per-record fetch failures are isolated to the item that
    /// produced them; everything else aborts the step in progress.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Embedding(_) | Error::Fetch(_))
    }

    /// Classify a transport-level reqwest failure.
    ///
    /// Connection and timeout failures mean the service is unreachable; any
    /// other failure is handed to `fallback` so callers keep their own
    /// error category.
    pub fn from_transport(e: reqwest::Error, fallback: fn(String) -> Error) -> Error {
        if e.is_connect() || e.is_timeout() {
            Error::BackendUnavailable(e.to_string())
        } else {
            fallback(format!("Request failed: {}", e))
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::from_transport(e, Error::Request)
    }
}
