use agora_domain::{FollowPair, UserId};
use axum::Json;
use axum::extract::{Path, State};
use tracing::info;

use crate::dto::{FollowStatusResponse, ToggleFollowResponse};
use crate::error::ApiResult;
use crate::state::AppState;

fn follow_pair(follower_id: String, followee_id: String) -> ApiResult<FollowPair> {
    Ok(FollowPair::new(
        UserId::new(follower_id)?,
        UserId::new(followee_id)?,
    )?)
}

pub async fn follow_status_handler(
    State(state): State<AppState>,
    Path((follower_id, followee_id)): Path<(String, String)>,
) -> ApiResult<Json<FollowStatusResponse>> {
    let pair = follow_pair(follower_id, followee_id)?;
    let marker = state.follows.check_follow(&pair).await?;

    Ok(Json(FollowStatusResponse {
        status: marker.as_str().to_owned(),
    }))
}

pub async fn toggle_follow_handler(
    State(state): State<AppState>,
    Path((follower_id, followee_id)): Path<(String, String)>,
) -> ApiResult<Json<ToggleFollowResponse>> {
    let pair = follow_pair(follower_id, followee_id)?;
    let outcome = state.follows.toggle_follow(&pair).await?;
    info!(pair = %pair, result = outcome.as_str(), "follow toggled");

    Ok(Json(ToggleFollowResponse {
        result: outcome.as_str().to_owned(),
    }))
}
