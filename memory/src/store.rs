//! # Memory Store
//!
//! Creates fragments and retrieves them ranked by a time-decayed score.
//!
//! Retrieval oversamples `3 * k` candidates from the backend, scores each with
//! [`DecayParams::retrieval_score`], sorts by score, and keeps those at or above the threshold
//! that the episode has not surfaced yet. Kept fragments get `last_accessed_at = now` and
//! `recall_count + 1`, written back through the backend.

use memory_core::{
    Clock, DecayParams, FragmentMetadata, MemoryError, MemoryFragment, MemoryResult,
    MetadataFilter, SystemClock, VectorStore,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::input::OneOrMany;
use crate::recall::RecalledSet;

pub const DEFAULT_MEMORY_TYPE: &str = "default";
pub const DEFAULT_IMPORTANCE: f64 = 1.0;

const CANDIDATE_FACTOR: usize = 3;

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

fn next_id(now_millis: i64) -> String {
    format!("mem_{}_{}", now_millis, ID_SEQUENCE.fetch_add(1, Ordering::Relaxed))
}

/// A fragment surfaced by retrieval, with the scores that ranked it.
///
/// `fragment.metadata` already reflects this recall.
#[derive(Debug, Clone, PartialEq)]
pub struct RecalledMemory {
    pub fragment: MemoryFragment,
    /// Backend similarity, clamped to [0, 1].
    pub similarity: f64,
    pub score: f64,
}

/// Long-term memory over a shared [`VectorStore`].
///
/// One instance is shared by every conversation. `store` and the read-score-update sequence of
/// `retrieve` run under one lock so concurrent recalls never lose a `recall_count` increment.
pub struct MemoryStore {
    backend: Arc<dyn VectorStore>,
    params: DecayParams,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new(backend: Arc<dyn VectorStore>) -> Self {
        Self {
            backend,
            params: DecayParams::default(),
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
        }
    }

    pub fn with_params(mut self, params: DecayParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn params(&self) -> &DecayParams {
        &self.params
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub async fn count(&self) -> MemoryResult<usize> {
        Ok(self.backend.count().await?)
    }

    /// Stores one fragment per content item and returns their ids.
    ///
    /// `memory_type` and `importance` are either a single value applied to every item or a
    /// list of the same length as `content`. Importance must be finite and within [0, 1].
    #[instrument(skip_all)]
    pub async fn store(
        &self,
        content: impl Into<OneOrMany<String>>,
        memory_type: impl Into<OneOrMany<String>>,
        importance: impl Into<OneOrMany<f64>>,
    ) -> MemoryResult<Vec<String>> {
        let contents = content.into().into_vec();
        let types = memory_type.into().expand(contents.len(), "type")?;
        let importances = importance.into().expand(contents.len(), "importance")?;
        if let Some(bad) = importances
            .iter()
            .find(|i| !i.is_finite() || !(0.0..=1.0).contains(*i))
        {
            return Err(MemoryError::Validation(format!(
                "importance must be within [0, 1], got {}",
                bad
            )));
        }
        if contents.is_empty() {
            info!("step: memory store called with no content, ignored");
            return Ok(Vec::new());
        }

        let _guard = self.lock.lock().await;
        let now_millis = self.clock.now_millis();
        let now = now_millis.div_euclid(1000);
        let fragments: Vec<MemoryFragment> = contents
            .into_iter()
            .zip(types)
            .zip(importances)
            .map(|((content, memory_type), importance)| MemoryFragment {
                id: next_id(now_millis),
                content,
                metadata: FragmentMetadata::new(memory_type, importance, now),
            })
            .collect();
        let ids: Vec<String> = fragments.iter().map(|f| f.id.clone()).collect();
        for f in &fragments {
            debug!(id = %f.id, memory_type = %f.metadata.memory_type, importance = f.metadata.importance, content = %f.content, "memory fragment");
        }
        self.backend.add(fragments).await?;
        info!(count = ids.len(), "step: memory fragments stored");
        Ok(ids)
    }

    /// Up to `k` fragments relevant to `query`, best first, skipping ids in `recalled`.
    ///
    /// Kept ids are added to `recalled`. An empty store yields an empty list. A candidate whose
    /// metadata update fails is logged and skipped; the rest of the batch is still returned.
    #[instrument(skip(self, query, filter, recalled), fields(query_len = query.len()))]
    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        score_threshold: f64,
        filter: Option<&MetadataFilter>,
        recalled: &mut RecalledSet,
    ) -> MemoryResult<Vec<RecalledMemory>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let _guard = self.lock.lock().await;
        let hits = self
            .backend
            .search(query, k.saturating_mul(CANDIDATE_FACTOR), filter)
            .await?;
        let now = self.clock.now_secs();

        let mut scored: Vec<RecalledMemory> = hits
            .into_iter()
            .map(|hit| {
                let similarity = if hit.similarity.is_nan() {
                    0.0
                } else {
                    hit.similarity.clamp(0.0, 1.0)
                };
                let score = self
                    .params
                    .retrieval_score(similarity, &hit.fragment.metadata, now);
                RecalledMemory {
                    fragment: hit.fragment,
                    similarity,
                    score,
                }
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut kept = Vec::new();
        for mut memory in scored {
            if kept.len() >= k {
                break;
            }
            if memory.score < score_threshold || recalled.contains(&memory.fragment.id) {
                continue;
            }
            let mut metadata = memory.fragment.metadata.clone();
            metadata.last_accessed_at = now;
            metadata.recall_count += 1;
            if let Err(e) = self
                .backend
                .update_metadata(&memory.fragment.id, &metadata)
                .await
            {
                warn!(id = %memory.fragment.id, error = %e, "step: recall bookkeeping write failed, fragment skipped");
                continue;
            }
            memory.fragment.metadata = metadata;
            recalled.insert(memory.fragment.id.clone());
            kept.push(memory);
        }

        if kept.is_empty() {
            info!(score_threshold, "step: no memory above threshold");
        } else {
            for (i, m) in kept.iter().enumerate() {
                info!(
                    rank = i + 1,
                    id = %m.fragment.id,
                    similarity = m.similarity,
                    importance = m.fragment.metadata.importance,
                    score = m.score,
                    "step: memory recalled"
                );
            }
        }
        Ok(kept)
    }
}

/// Renders recalled memories as one `<memory>` system note, labelled by creation time.
pub fn format_recalled(memories: &[RecalledMemory], now_secs: i64) -> Option<String> {
    let items: Vec<(i64, &str)> = memories
        .iter()
        .map(|m| (m.fragment.metadata.created_at, m.fragment.content.as_str()))
        .collect();
    prompt::format_memory_block(&items, now_secs)
}
