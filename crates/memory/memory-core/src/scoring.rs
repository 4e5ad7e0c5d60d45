//! Time-decayed retrieval scoring.
//!
//! ```text
//! days           = max(0, (now - last_accessed_at) / 86400)
//! half_life      = base_half_life * (1 + recall_count) ^ strength_factor
//! decay          = exp(-ln(2) * days / half_life)
//! recency_factor = (1 - importance) * decay + importance
//! base_score     = similarity * recency_factor
//! strength       = 1.15 + 0.5 * importance ^ importance_curve
//! score          = base_score ^ (1 / strength)
//! ```

use crate::types::FragmentMetadata;

const SECS_PER_DAY: f64 = 86_400.0;

/// Tunables of the decay curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayParams {
    /// Days for an unrecalled, zero-importance memory to lose half its recency weight.
    pub base_half_life: f64,
    /// How strongly each recall stretches the half-life, in [0, 1].
    pub strength_factor: f64,
    /// Steepness of the importance boost, in (0, 1).
    pub importance_curve: f64,
}

impl Default for DecayParams {
    fn default() -> Self {
        Self {
            base_half_life: 7.0,
            strength_factor: 0.5,
            importance_curve: 0.3,
        }
    }
}

impl DecayParams {
    pub fn half_life(&self, recall_count: u32) -> f64 {
        self.base_half_life * (1.0 + recall_count as f64).powf(self.strength_factor)
    }

    /// Weight in [importance, 1] applied to similarity.
    pub fn recency_factor(&self, importance: f64, days: f64, recall_count: u32) -> f64 {
        let days = days.max(0.0);
        let decay = (-std::f64::consts::LN_2 * days / self.half_life(recall_count)).exp();
        (1.0 - importance) * decay + importance
    }

    /// Score from raw components. `similarity` is clamped to [0, 1].
    pub fn score(&self, similarity: f64, importance: f64, days: f64, recall_count: u32) -> f64 {
        let similarity = if similarity.is_nan() {
            0.0
        } else {
            similarity.clamp(0.0, 1.0)
        };
        let base_score = similarity * self.recency_factor(importance, days, recall_count);
        let strength = 1.15 + 0.5 * importance.powf(self.importance_curve);
        base_score.powf(1.0 / strength)
    }

    /// Score of a fragment with `metadata` at `now_secs`.
    pub fn retrieval_score(&self, similarity: f64, metadata: &FragmentMetadata, now_secs: i64) -> f64 {
        let days = (now_secs - metadata.last_accessed_at) as f64 / SECS_PER_DAY;
        self.score(similarity, metadata.importance, days, metadata.recall_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn matches_formula_by_hand() {
        let p = DecayParams::default();
        // 7 days, never recalled: decay = 0.5
        let days = 7.0;
        let importance: f64 = 0.2;
        let recency: f64 = 0.8 * 0.5 + 0.2;
        let strength = 1.15 + 0.5 * importance.powf(0.3);
        let expected = (0.8 * recency).powf(1.0 / strength);
        assert!((p.score(0.8, importance, days, 0) - expected).abs() < EPS);
    }

    #[test]
    fn recall_count_stretches_half_life() {
        let p = DecayParams::default();
        assert!((p.half_life(0) - 7.0).abs() < EPS);
        assert!((p.half_life(3) - 14.0).abs() < EPS);
        assert!(p.score(0.7, 0.1, 10.0, 3) > p.score(0.7, 0.1, 10.0, 0));
    }

    #[test]
    fn score_strictly_decreases_with_age() {
        let p = DecayParams::default();
        for importance in [0.0, 0.3, 0.6, 0.99] {
            let mut last = f64::INFINITY;
            for days in [0.0, 0.5, 1.0, 3.0, 7.0, 30.0, 365.0] {
                let s = p.score(0.75, importance, days, 2);
                assert!(s < last, "importance {} days {}", importance, days);
                last = s;
            }
        }
    }

    #[test]
    fn importance_never_lowers_score() {
        let p = DecayParams::default();
        for days in [0.0, 1.0, 14.0, 200.0] {
            let mut last = -1.0;
            for step in 0..=20 {
                let importance = step as f64 / 20.0;
                let s = p.score(0.6, importance, days, 1);
                assert!(s >= last, "days {} importance {}", days, importance);
                last = s;
            }
        }
    }

    #[test]
    fn max_importance_does_not_decay() {
        let p = DecayParams::default();
        for days in [0.0, 10.0, 1_000.0] {
            assert!((p.recency_factor(1.0, days, 0) - 1.0).abs() < EPS);
        }
        assert!((p.score(0.5, 1.0, 0.0, 0) - p.score(0.5, 1.0, 500.0, 0)).abs() < EPS);
    }

    #[test]
    fn similarity_is_clamped_and_future_access_counts_as_now() {
        let p = DecayParams::default();
        assert_eq!(p.score(-0.3, 0.5, 1.0, 0), 0.0);
        assert!((p.score(1.7, 0.5, 0.0, 0) - 1.0).abs() < EPS);
        let meta = FragmentMetadata::new("fact", 0.5, 1_000);
        assert!((p.retrieval_score(0.9, &meta, 500) - p.score(0.9, 0.5, 0.0, 0)).abs() < EPS);
    }
}
