//! # In-Memory Vector Store
//!
//! [`VectorStore`] kept in process memory. Contents are embedded on `add` with the configured
//! [`EmbeddingService`]; `search` ranks by cosine similarity. Data is lost on restart.
//!
//! ## Thread Safety
//!
//! The store uses `Arc<RwLock<>>` so clones share the same fragments.

use async_trait::async_trait;
use embedding::EmbeddingService;
use memory_core::{
    cosine_similarity, FragmentMetadata, MemoryFragment, MetadataFilter, SearchHit, VectorStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

struct StoredFragment {
    fragment: MemoryFragment,
    embedding: Vec<f32>,
    /// Insertion order, used to break similarity ties.
    seq: u64,
}

#[derive(Default)]
struct Inner {
    fragments: HashMap<String, StoredFragment>,
    next_seq: u64,
}

/// In-memory vector store for tests, development and ephemeral deployments.
#[derive(Clone)]
pub struct InMemoryVectorStore {
    inner: Arc<RwLock<Inner>>,
    embedding: Arc<dyn EmbeddingService>,
}

impl InMemoryVectorStore {
    pub fn new(embedding: Arc<dyn EmbeddingService>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            embedding,
        }
    }

    /// Returns a stored fragment by id.
    pub async fn get(&self, id: &str) -> Option<MemoryFragment> {
        self.inner
            .read()
            .await
            .fragments
            .get(id)
            .map(|s| s.fragment.clone())
    }

    pub async fn clear(&self) {
        self.inner.write().await.fragments.clear();
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
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

        let mut inner = self.inner.write().await;
        if let Some(dup) = fragments.iter().find(|f| inner.fragments.contains_key(&f.id)) {
            anyhow::bail!("Fragment id already exists: {}", dup.id);
        }
        for (fragment, embedding) in fragments.into_iter().zip(embeddings) {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            debug!(id = %fragment.id, dimension = embedding.len(), "In-memory vector store add");
            inner.fragments.insert(
                fragment.id.clone(),
                StoredFragment {
                    fragment,
                    embedding,
                    seq,
                },
            );
        }
        info!(total = inner.fragments.len(), "step: in-memory vector store add done");
        Ok(())
    }

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
        let inner = self.inner.read().await;

        let mut scored: Vec<(f32, u64, &MemoryFragment)> = inner
            .fragments
            .values()
            .filter(|s| filter.map_or(true, |f| f.matches(&s.fragment.metadata)))
            .map(|s| (cosine_similarity(&query_embedding, &s.embedding), s.seq, &s.fragment))
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .take(k)
            .map(|(similarity, _, fragment)| SearchHit {
                fragment: fragment.clone(),
                similarity: similarity as f64,
            })
            .collect();
        info!(k, count = hits.len(), "step: in-memory vector store search done");
        Ok(hits)
    }

    async fn update_metadata(&self, id: &str, metadata: &FragmentMetadata) -> Result<(), anyhow::Error> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .fragments
            .get_mut(id)
            .ok_or_else(|| anyhow::anyhow!("Unknown fragment id: {}", id))?;
        stored.fragment.metadata = metadata.clone();
        Ok(())
    }

    async fn count(&self) -> Result<usize, anyhow::Error> {
        Ok(self.inner.read().await.fragments.len())
    }
}
