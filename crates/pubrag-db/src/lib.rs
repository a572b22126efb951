//! # pubrag-db
//!
//! Storage layer for the pubmed-rag semantic cache.
//!
//! This crate provides:
//! - Connection pool management
//! - pgvector-backed article cache ([`PgArticleCache`])
//! - In-memory vector store for database-less runs ([`InMemoryVectorStore`])
//! - Embedded schema migrations (feature `migrations`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use pubrag_db::Database;
//! use pubrag_core::VectorStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/pubrag", 1536).await?;
//!     db.migrate().await?;
//!     println!("{} cached articles", db.articles.count().await?);
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod articles;
pub mod memory;
pub mod pool;
pub mod test_fixtures;

pub use articles::PgArticleCache;
pub use memory::{cosine_similarity, InMemoryVectorStore};
pub use pool::{create_pool, log_pool_metrics, PoolConfig};

use pubrag_core::{Error, Result, Vector};

/// Reject vectors whose length differs from the store dimension.
pub(crate) fn check_dimension(vector: &Vector, dimension: usize) -> Result<()> {
    let len = vector.as_slice().len();
    if len != dimension {
        return Err(Error::InvalidInput(format!(
            "vector has {} dimensions, store expects {}",
            len, dimension
        )));
    }
    Ok(())
}

/// Database context owning the pool and the article cache.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Semantic cache table.
    pub articles: PgArticleCache,
}

impl Database {
    /// Wrap an existing pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>, embed_dimension: usize) -> Self {
        Self {
            articles: PgArticleCache::new(pool.clone(), embed_dimension),
            pool,
        }
    }

    /// Connect with the default pool configuration.
    pub async fn connect(url: &str, embed_dimension: usize) -> Result<Self> {
        Self::connect_with_config(url, PoolConfig::default(), embed_dimension).await
    }

    /// Connect with a custom pool configuration.
    pub async fn connect_with_config(
        url: &str,
        config: PoolConfig,
        embed_dimension: usize,
    ) -> Result<Self> {
        let pool = create_pool(url, config).await?;
        Ok(Self::new(pool, embed_dimension))
    }

    /// Run embedded migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        log_pool_metrics(&self.pool);
        self.pool.close().await;
    }
}
