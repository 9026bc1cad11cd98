use agora_application::FollowRepository;
use agora_core::AppResult;
use agora_domain::{FollowMarker, FollowPair, ToggleOutcome};
use async_trait::async_trait;

use super::{PostgresCommunityStore, store_error};

#[async_trait]
impl FollowRepository for PostgresCommunityStore {
    async fn check_follow(&self, pair: &FollowPair) -> AppResult<FollowMarker> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM follows
                WHERE follower_id = $1
                    AND followee_id = $2
            )
            "#,
        )
        .bind(pair.follower_id().as_str())
        .bind(pair.followee_id().as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| store_error("failed to check follow relationship", error))?;

        Ok(if exists {
            FollowMarker::Follow
        } else {
            FollowMarker::None
        })
    }

    async fn toggle_follow(&self, pair: &FollowPair) -> AppResult<ToggleOutcome> {
        let mut transaction = self
            .pool
            .begin()
            .await
            .map_err(|error| store_error("failed to begin transaction", error))?;

        // Serializes concurrent toggles of one pair; released on commit or rollback.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(format!(
                "follows:{}:{}",
                pair.follower_id(),
                pair.followee_id()
            ))
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error("failed to lock follow relationship", error))?;

        let removed = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_id = $1
                AND followee_id = $2
            "#,
        )
        .bind(pair.follower_id().as_str())
        .bind(pair.followee_id().as_str())
        .execute(&mut *transaction)
        .await
        .map_err(|error| store_error("failed to remove follow relationship", error))?
        .rows_affected();

        let outcome = if removed > 0 {
            ToggleOutcome::Unfollowed
        } else {
            sqlx::query(
                r#"
                INSERT INTO follows (follower_id, followee_id)
                VALUES ($1, $2)
                "#,
            )
            .bind(pair.follower_id().as_str())
            .bind(pair.followee_id().as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| store_error("failed to create follow relationship", error))?;

            ToggleOutcome::Following
        };

        transaction
            .commit()
            .await
            .map_err(|error| store_error("failed to commit follow toggle", error))?;

        Ok(outcome)
    }
}
