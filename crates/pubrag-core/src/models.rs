//! Core data models for pubmed-rag.
//!
//! Records flow through the pipeline in this order: a literature source
//! produces [`ArticleRecord`]s, the semantic cache persists them as
//! [`CacheEntry`]s, and both sides are presented to the formatter as
//! [`RetrievedResult`]s tagged with their [`Source`].

use serde::{Deserialize, Serialize};

pub use pgvector::Vector;

use crate::defaults;

// =============================================================================
// ARTICLES
// =============================================================================

/// One normalized literature item.
///
/// Every optional field has already been replaced by its "not available"
/// sentinel, so formatting never has to deal with a missing value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// External identifier (PubMed PMID).
    pub id: String,
    pub title: String,
    /// Abstract text; empty when the record has none.
    pub abstract_text: String,
    /// Authors as `"Fore Last, Fore Last"`.
    pub authors: String,
    pub journal: String,
    /// MeSH descriptor names joined by `", "`.
    pub keywords: String,
    /// `YYYY-MM-DD` or [`defaults::DATE_NOT_AVAILABLE`].
    pub publication_date: String,
    pub url: String,
}

impl ArticleRecord {
    /// Whether the record can be stored in the semantic cache.
    pub fn is_cacheable(&self) -> bool {
        !self.abstract_text.trim().is_empty()
    }

    /// Canonical article URL for an external identifier.
    pub fn url_for(id: &str) -> String {
        format!("{}{}", defaults::PUBMED_ARTICLE_URL, id)
    }
}

/// Denormalized article metadata stored next to each cached abstract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    pub title: String,
    pub journal: String,
    pub authors: String,
    pub publication_date: String,
    pub keywords: String,
}

impl From<&ArticleRecord> for CacheMetadata {
    fn from(record: &ArticleRecord) -> Self {
        Self {
            title: record.title.clone(),
            journal: record.journal.clone(),
            authors: record.authors.clone(),
            publication_date: record.publication_date.clone(),
            keywords: record.keywords.clone(),
        }
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Persisted unit of the semantic cache, keyed by article id.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub id: String,
    /// The abstract the embedding was computed from.
    pub document_text: String,
    pub embedding: Vector,
    pub metadata: CacheMetadata,
}

impl CacheEntry {
    /// Build an entry from a record and its abstract embedding.
    pub fn new(record: &ArticleRecord, embedding: Vector) -> Self {
        Self {
            id: record.id.clone(),
            document_text: record.abstract_text.clone(),
            embedding,
            metadata: CacheMetadata::from(record),
        }
    }
}

/// A nearest-neighbor match returned by a vector store.
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub id: String,
    pub document_text: String,
    pub metadata: CacheMetadata,
    /// Similarity in `[-1, 1]`, higher is closer.
    pub score: f32,
}

// =============================================================================
// STRUCTURED QUERY
// =============================================================================

/// Publication date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, alias = "start_date")]
    pub start: Option<String>,
    #[serde(default, alias = "end_date")]
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new(defaults::DATE_RANGE_START, defaults::DATE_RANGE_END)
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.as_deref().unwrap_or("?"),
            self.end.as_deref().unwrap_or("?")
        )
    }
}

/// Publication date as returned by the translator.
///
/// Models answer with a `{start, end}` object, a free-text range, or
/// occasionally something else entirely; all shapes are kept for
/// traceability and none is validated further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PublicationDate {
    Range(DateRange),
    Text(String),
    Other(serde_json::Value),
}

impl Default for PublicationDate {
    fn default() -> Self {
        PublicationDate::Range(DateRange::default())
    }
}

/// Output of query translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    /// Controlled-vocabulary (MeSH) terms extracted from the query.
    #[serde(default, deserialize_with = "string_or_seq")]
    pub mesh_terms: Vec<String>,
    /// Requested publication window.
    #[serde(default)]
    pub publication_date: Option<PublicationDate>,
    /// Search-engine-ready query string; the only field used downstream.
    pub pubmed_query: String,
}

/// Accept either a JSON array of strings or a single comma-separated string.
fn string_or_seq<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(terms_from_value(&serde_json::Value::deserialize(deserializer)?))
}

/// Extract term strings from an arbitrary JSON value.
///
/// Arrays keep their string elements and drop everything else; a string is
/// split on commas; any other shape yields no terms.
pub fn terms_from_value(value: &serde_json::Value) -> Vec<String> {
    use serde_json::Value;

    let clean = |t: &str| Some(t.trim()).filter(|t| !t.is_empty()).map(String::from);
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(clean)
            .collect(),
        Value::String(s) => s.split(',').filter_map(clean).collect(),
        _ => Vec::new(),
    }
}

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Provenance of a retrieved result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Fetched from the literature database for this query.
    Live,
    /// Retrieved from the semantic cache.
    Cache,
}

impl Source {
    /// Label shown on formatted article cards.
    pub fn card_label(&self) -> &'static str {
        match self {
            Self::Live => "Pubmed",
            Self::Cache => "RAG",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Cache => write!(f, "cache"),
        }
    }
}

/// An article ready for merging, tagged with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedResult {
    pub id: String,
    pub abstract_text: String,
    pub metadata: CacheMetadata,
    pub source: Source,
    /// Article URL when known (live results).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Store similarity for cache results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl From<&ArticleRecord> for RetrievedResult {
    fn from(record: &ArticleRecord) -> Self {
        Self {
            id: record.id.clone(),
            abstract_text: record.abstract_text.clone(),
            metadata: CacheMetadata::from(record),
            source: Source::Live,
            url: Some(record.url.clone()),
            score: None,
        }
    }
}

impl From<CacheHit> for RetrievedResult {
    fn from(hit: CacheHit) -> Self {
        Self {
            id: hit.id,
            abstract_text: hit.document_text,
            metadata: hit.metadata,
            source: Source::Cache,
            url: None,
            score: Some(hit.score),
        }
    }
}
