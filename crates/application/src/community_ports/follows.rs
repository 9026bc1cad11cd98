use agora_core::AppResult;
use agora_domain::{FollowMarker, FollowPair, ToggleOutcome};
use async_trait::async_trait;

/// Store port for follow relationships.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Reads the current relationship marker for an ordered pair.
    async fn check_follow(&self, pair: &FollowPair) -> AppResult<FollowMarker>;

    /// Atomically flips the relationship for an ordered pair and returns the new value.
    async fn toggle_follow(&self, pair: &FollowPair) -> AppResult<ToggleOutcome>;
}
