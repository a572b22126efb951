//! Centralized default constants for pubmed-rag.
//!
//! **This module is the single source of truth** for shared default values.
//! Values that callers may want to change (result counts, the default date
//! window) are overridable through configuration; the constants here are only
//! the fallbacks.

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Number of live articles requested from the literature database.
pub const RESULT_LIMIT: usize = 5;

/// Number of nearest neighbors requested from the semantic cache.
pub const LOOKUP_K: usize = 5;

/// Concurrent per-article fetches. The client-wide quota still applies.
pub const FETCH_CONCURRENCY: usize = 3;

/// Start of the publication window used when the user gives no dates.
pub const DATE_RANGE_START: &str = "2022-01-01";

/// End of the publication window used when the user gives no dates.
pub const DATE_RANGE_END: &str = "2024-12-31";

// =============================================================================
// LITERATURE DATABASE
// =============================================================================

/// NCBI E-utilities base URL.
pub const EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Entrez database searched for articles.
pub const EUTILS_DB: &str = "pubmed";

/// Tool name reported to NCBI with every request.
pub const EUTILS_TOOL: &str = "pubmed-rag";

/// Timeout for E-utilities requests in seconds.
pub const EUTILS_TIMEOUT_SECS: u64 = 30;

/// NCBI request quota without an API key.
pub const EUTILS_REQUESTS_PER_SEC: u32 = 3;

/// NCBI request quota when an API key is sent.
pub const EUTILS_REQUESTS_PER_SEC_WITH_KEY: u32 = 10;

/// Prefix of the public article URL; the PMID is appended.
pub const PUBMED_ARTICLE_URL: &str = "https://www.ncbi.nlm.nih.gov/pubmed/";

// =============================================================================
// SENTINELS
// =============================================================================

pub const TITLE_NOT_AVAILABLE: &str = "Title Not Available";
pub const AUTHORS_NOT_AVAILABLE: &str = "Authors Not Available";
pub const JOURNAL_NOT_AVAILABLE: &str = "Journal Not Available";
pub const KEYWORD_NOT_AVAILABLE: &str = "Keyword Not Available";
pub const DATE_NOT_AVAILABLE: &str = "Not Available";

// =============================================================================
// INFERENCE
// =============================================================================

/// Default OpenAI-compatible API endpoint.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default embedding model name.
pub const EMBED_MODEL: &str = "text-embedding-3-small";

/// Default embedding vector dimension for text-embedding-3-small.
pub const EMBED_DIMENSION: usize = 1536;

/// Default completion model name.
pub const GEN_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for every completion request.
pub const GEN_TEMPERATURE: f32 = 0.0;

/// Timeout for inference requests in seconds.
pub const INFERENCE_TIMEOUT_SECS: u64 = 120;

// =============================================================================
// DATABASE
// =============================================================================

/// Default maximum number of pooled connections.
pub const DB_MAX_CONNECTIONS: u32 = 5;

/// Default connection acquire timeout in seconds.
pub const DB_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle connection timeout in seconds.
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;
