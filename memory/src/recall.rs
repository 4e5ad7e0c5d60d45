//! Per-conversation recall state.

use memory_core::{MemoryResult, MetadataFilter};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::store::{MemoryStore, RecalledMemory};

/// Fragment ids already surfaced in the current episode.
#[derive(Debug, Clone, Default)]
pub struct RecalledSet {
    ids: HashSet<String>,
}

impl RecalledSet {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false when `id` was already present.
    pub fn insert(&mut self, id: String) -> bool {
        self.ids.insert(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// One conversation's view of the shared [`MemoryStore`]: retrieval deduplicated within the
/// episode, reset when the context is compacted.
pub struct RecallSession {
    store: Arc<MemoryStore>,
    recalled: Mutex<RecalledSet>,
}

impl RecallSession {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            recalled: Mutex::new(RecalledSet::default()),
        }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        score_threshold: f64,
        filter: Option<&MetadataFilter>,
    ) -> MemoryResult<Vec<RecalledMemory>> {
        let mut recalled = self.recalled.lock().await;
        self.store
            .retrieve(query, k, score_threshold, filter, &mut recalled)
            .await
    }

    /// Starts a new episode: previously surfaced fragments may be recalled again.
    pub async fn clear_recalled_ids(&self) {
        let mut recalled = self.recalled.lock().await;
        let cleared = recalled.len();
        recalled.clear();
        info!(cleared, "step: recalled memory ids cleared");
    }

    pub async fn recalled_count(&self) -> usize {
        self.recalled.lock().await.len()
    }
}
