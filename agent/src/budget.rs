//! Token budget: when the last reported usage exceeds the limit, the context is compacted.

/// Default context budget in tokens.
pub const DEFAULT_TOKEN_LIMIT: u32 = 16_000;

/// True when `token_usage` is strictly above `limit`.
pub fn over_budget(token_usage: u32, limit: u32) -> bool {
    token_usage > limit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trips_only_above_limit() {
        assert!(over_budget(20_000, 16_000));
        assert!(!over_budget(16_000, 16_000));
        assert!(!over_budget(0, DEFAULT_TOKEN_LIMIT));
    }
}
