//! pgvector-backed article cache.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;

use pubrag_core::{CacheEntry, CacheHit, CacheMetadata, Error, Result, Vector, VectorStore};

use crate::check_dimension;

/// PostgreSQL implementation of [`VectorStore`] over the `article_cache` table.
#[derive(Clone)]
pub struct PgArticleCache {
    pool: Pool<Postgres>,
    dimension: usize,
}

impl PgArticleCache {
    /// Create a cache over `pool` accepting vectors of `dimension` components.
    pub fn new(pool: Pool<Postgres>, dimension: usize) -> Self {
        Self { pool, dimension }
    }

    /// Load one entry by id.
    pub async fn get(&self, id: &str) -> Result<Option<CacheEntry>> {
        let row = sqlx::query(
            "SELECT id, document_text, title, journal, authors, publication_date, keywords, embedding
             FROM article_cache
             WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| CacheEntry {
            id: row.get("id"),
            document_text: row.get("document_text"),
            embedding: row.get("embedding"),
            metadata: metadata_from_row(&row),
        }))
    }
}

fn metadata_from_row(row: &sqlx::postgres::PgRow) -> CacheMetadata {
    CacheMetadata {
        title: row.get("title"),
        journal: row.get("journal"),
        authors: row.get("authors"),
        publication_date: row.get("publication_date"),
        keywords: row.get("keywords"),
    }
}

#[async_trait]
impl VectorStore for PgArticleCache {
    async fn upsert(&self, entries: Vec<CacheEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }
        for entry in &entries {
            check_dimension(&entry.embedding, self.dimension)?;
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for entry in &entries {
            sqlx::query(
                "INSERT INTO article_cache
                     (id, document_text, title, journal, authors, publication_date, keywords, embedding)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (id) DO UPDATE SET
                     document_text = EXCLUDED.document_text,
                     title = EXCLUDED.title,
                     journal = EXCLUDED.journal,
                     authors = EXCLUDED.authors,
                     publication_date = EXCLUDED.publication_date,
                     keywords = EXCLUDED.keywords,
                     embedding = EXCLUDED.embedding,
                     updated_at = NOW()",
            )
            .bind(&entry.id)
            .bind(&entry.document_text)
            .bind(&entry.metadata.title)
            .bind(&entry.metadata.journal)
            .bind(&entry.metadata.authors)
            .bind(&entry.metadata.publication_date)
            .bind(&entry.metadata.keywords)
            .bind(&entry.embedding)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "article_cache",
            op = "upsert",
            result_count = entries.len(),
            "Cache entries written"
        );
        Ok(())
    }

    async fn query_nearest(&self, embedding: &Vector, k: usize) -> Result<Vec<CacheHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        check_dimension(embedding, self.dimension)?;

        let rows = sqlx::query(
            "SELECT id, document_text, title, journal, authors, publication_date, keywords,
                    1.0 - (embedding <=> $1::vector) AS score
             FROM article_cache
             WHERE vector_dims(embedding) = $3
             ORDER BY embedding <=> $1::vector, id
             LIMIT $2",
        )
        .bind(embedding)
        .bind(k as i64)
        .bind(self.dimension as i32)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let hits: Vec<CacheHit> = rows
            .into_iter()
            .map(|row| CacheHit {
                id: row.get("id"),
                document_text: row.get("document_text"),
                metadata: metadata_from_row(&row),
                score: row.get::<f64, _>("score") as f32,
            })
            .collect();

        debug!(
            subsystem = "database",
            component = "article_cache",
            op = "query_nearest",
            k,
            result_count = hits.len(),
            "Nearest neighbors loaded"
        );
        Ok(hits)
    }

    /// Entries whose embedding matches this cache's dimension.
    async fn count(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM article_cache WHERE vector_dims(embedding) = $1",
        )
        .bind(self.dimension as i32)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(count as usize)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
