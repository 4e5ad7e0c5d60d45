//! # Vector Store
//!
//! The similarity-search capability the memory store is built on. Backends (in-memory,
//! SQLite) embed fragment contents themselves; callers pass plain text.

use async_trait::async_trait;

use crate::types::{FragmentMetadata, MemoryFragment, MetadataFilter, SearchHit};

/// Trait for storing fragments and searching them by similarity.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Adds fragments. Ids are assigned by the caller and must be unique.
    async fn add(&self, fragments: Vec<MemoryFragment>) -> Result<(), anyhow::Error>;

    /// Returns up to `k` fragments nearest to `query`, most similar first.
    async fn search(
        &self,
        query: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, anyhow::Error>;

    /// Replaces the metadata of fragment `id`. Unknown ids are an error.
    async fn update_metadata(&self, id: &str, metadata: &FragmentMetadata) -> Result<(), anyhow::Error>;

    /// Number of stored fragments.
    async fn count(&self) -> Result<usize, anyhow::Error>;
}

/// Cosine similarity of two vectors; 0.0 when either is empty, zero or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
