//! # SQLite Vector Store
//!
//! Persistent [`VectorStore`]: fragments, their metadata and their embeddings live in one
//! SQLite table, so recall bookkeeping (`last_accessed_at`, `recall_count`) survives restarts.
//! Search is a linear cosine scan over the rows that pass the metadata filter.
//!
//! ## Database Schema
//!
//! ```sql
//! CREATE TABLE memory_fragments (
//!     id TEXT PRIMARY KEY,
//!     content TEXT NOT NULL,
//!     memory_type TEXT NOT NULL,
//!     importance REAL NOT NULL,
//!     created_at INTEGER NOT NULL,
//!     last_accessed_at INTEGER NOT NULL,
//!     recall_count INTEGER NOT NULL,
//!     embedding BLOB NOT NULL
//! );
//! ```

use async_trait::async_trait;
use embedding::EmbeddingService;
use memory_core::{
    cosine_similarity, FragmentMetadata, MemoryFragment, MetadataFilter, SearchHit, VectorStore,
};
use sqlx::{sqlite::SqliteConnectOptions, Row, SqlitePool};
use std::sync::Arc;
use tracing::{info, instrument};

/// SQLite-based vector store for persistent memory fragments.
#[derive(Clone)]
pub struct SQLiteVectorStore {
    pool: SqlitePool,
    embedding: Arc<dyn EmbeddingService>,
}

impl SQLiteVectorStore {
    /// Opens (creating if missing) the database file at `database_path`.
    pub async fn new(
        database_path: &str,
        embedding: Arc<dyn EmbeddingService>,
    ) -> Result<Self, anyhow::Error> {
        let options = SqliteConnectOptions::new()
            .create_if_missing(true)
            .filename(database_path);
        let pool = SqlitePool::connect_with(options).await?;

        let store = Self { pool, embedding };
        store.init_schema().await?;
        info!(path = %database_path, "step: SQLite vector store opened");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), anyhow::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memory_fragments (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                memory_type TEXT NOT NULL,
                importance REAL NOT NULL,
                created_at INTEGER NOT NULL,
                last_accessed_at INTEGER NOT NULL,
                recall_count INTEGER NOT NULL,
                embedding BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_memory_type ON memory_fragments(memory_type);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns a stored fragment by id.
    pub async fn get(&self, id: &str) -> Result<Option<MemoryFragment>, anyhow::Error> {
        let row = sqlx::query(
            "SELECT id, content, memory_type, importance, created_at, last_accessed_at, recall_count \
             FROM memory_fragments WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(Self::row_to_fragment).transpose()?)
    }

    fn row_to_fragment(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryFragment, sqlx::Error> {
        let recall_count: i64 = row.try_get("recall_count")?;
        Ok(MemoryFragment {
            id: row.try_get("id")?,
            content: row.try_get("content")?,
            metadata: FragmentMetadata {
                memory_type: row.try_get("memory_type")?,
                importance: row.try_get("importance")?,
                created_at: row.try_get("created_at")?,
                last_accessed_at: row.try_get("last_accessed_at")?,
                recall_count: recall_count.max(0) as u32,
            },
        })
    }
}

/// Little-endian, 4 bytes per component.
fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[async_trait]
impl VectorStore for SQLiteVectorStore {
    #[instrument(skip(self, fragments), fields(count = fragments.len()))]
    async fn add(&self, fragments: Vec<MemoryFragment>) -> Result<(), anyhow::Error> {
        if fragments.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = fragments.iter().map(|f| f.content.clone()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;
        if embeddings.len() != fragments.len() {
            anyhow::bail!(
                "Expected {} embeddings, got {}",
                fragments.len(),
                embeddings.len()
            );
        }

        let mut tx = self.pool.begin().await?;
        for (fragment, embedding) in fragments.iter().zip(embeddings.iter()) {
            let m = &fragment.metadata;
            sqlx::query(
                r#"
                INSERT INTO memory_fragments (
                    id, content, memory_type, importance, created_at, last_accessed_at,
                    recall_count, embedding
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&fragment.id)
            .bind(&fragment.content)
            .bind(&m.memory_type)
            .bind(m.importance)
            .bind(m.created_at)
            .bind(m.last_accessed_at)
            .bind(m.recall_count as i64)
            .bind(encode_embedding(embedding))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(count = fragments.len(), "step: SQLite vector store add done");
        Ok(())
    }

    #[instrument(skip(self, query, filter))]
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, anyhow::Error> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedding.embed(query).await?;
        let memory_type = filter.and_then(|f| f.memory_type.clone());
        let min_importance = filter.and_then(|f| f.min_importance);

        let rows = sqlx::query(
            r#"
            SELECT id, content, memory_type, importance, created_at, last_accessed_at,
                   recall_count, embedding
            FROM memory_fragments
            WHERE (?1 IS NULL OR memory_type = ?1)
              AND (?2 IS NULL OR importance >= ?2)
            ORDER BY rowid
            "#,
        )
        .bind(memory_type)
        .bind(min_importance)
        .fetch_all(&self.pool)
        .await?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in &rows {
            let blob: Vec<u8> = row.try_get("embedding")?;
            let similarity = cosine_similarity(&query_embedding, &decode_embedding(&blob));
            hits.push(SearchHit {
                fragment: Self::row_to_fragment(row)?,
                similarity: similarity as f64,
            });
        }
        // stable: equal similarities keep insertion order
        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);
        info!(scanned = rows.len(), count = hits.len(), "step: SQLite vector store search done");
        Ok(hits)
    }

    async fn update_metadata(&self, id: &str, metadata: &FragmentMetadata) -> Result<(), anyhow::Error> {
        let result = sqlx::query(
            r#"
            UPDATE memory_fragments
            SET memory_type = ?1, importance = ?2, created_at = ?3,
                last_accessed_at = ?4, recall_count = ?5
            WHERE id = ?6
            "#,
        )
        .bind(&metadata.memory_type)
        .bind(metadata.importance)
        .bind(metadata.created_at)
        .bind(metadata.last_accessed_at)
        .bind(metadata.recall_count as i64)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            anyhow::bail!("Unknown fragment id: {}", id);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memory_fragments")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }
}
