//! # Core Types
//!
//! A [`MemoryFragment`] is one stored long-term memory: free text plus the metadata that drives
//! its retrieval score. Timestamps are unix seconds.

use serde::{Deserialize, Serialize};

/// Mutable bookkeeping of a fragment. `last_accessed_at` and `recall_count` change only when
/// a retrieval surfaces the fragment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FragmentMetadata {
    /// Free-form label (preference, fact, event, ...).
    #[serde(rename = "type")]
    pub memory_type: String,
    /// In [0, 1]; 1.0 never decays.
    pub importance: f64,
    pub created_at: i64,
    pub last_accessed_at: i64,
    pub recall_count: u32,
}

impl FragmentMetadata {
    /// Metadata of a fragment created at `now`, never recalled.
    pub fn new(memory_type: impl Into<String>, importance: f64, now: i64) -> Self {
        Self {
            memory_type: memory_type.into(),
            importance,
            created_at: now,
            last_accessed_at: now,
            recall_count: 0,
        }
    }
}

/// A stored long-term memory unit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryFragment {
    pub id: String,
    pub content: String,
    pub metadata: FragmentMetadata,
}

/// One similarity-search result. `similarity` is the backend's raw score.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub fragment: MemoryFragment,
    pub similarity: f64,
}

/// Metadata predicate applied by backends before ranking.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    pub memory_type: Option<String>,
    pub min_importance: Option<f64>,
}

impl MetadataFilter {
    pub fn by_type(memory_type: impl Into<String>) -> Self {
        Self {
            memory_type: Some(memory_type.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, metadata: &FragmentMetadata) -> bool {
        if let Some(t) = &self.memory_type {
            if &metadata.memory_type != t {
                return false;
            }
        }
        if let Some(min) = self.min_importance {
            if metadata.importance < min {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_type_and_importance() {
        let meta = FragmentMetadata::new("preference", 0.4, 100);
        assert!(MetadataFilter::default().matches(&meta));
        assert!(MetadataFilter::by_type("preference").matches(&meta));
        assert!(!MetadataFilter::by_type("event").matches(&meta));
        let strict = MetadataFilter {
            memory_type: None,
            min_importance: Some(0.5),
        };
        assert!(!strict.matches(&meta));
    }

    #[test]
    fn new_metadata_is_fresh() {
        let meta = FragmentMetadata::new("fact", 0.9, 42);
        assert_eq!(meta.created_at, 42);
        assert_eq!(meta.last_accessed_at, 42);
        assert_eq!(meta.recall_count, 0);
    }
}
