//! Literature database abstraction.

use async_trait::async_trait;

use pubrag_core::Result;

use crate::raw::RawPubmedArticle;

/// A searchable literature database.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Return up to `limit` identifiers matching `query`, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;

    /// Fetch the full raw record for one identifier.
    async fn fetch(&self, id: &str) -> Result<RawPubmedArticle>;
}
