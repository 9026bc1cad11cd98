use agora_application::{CommunityRoleResolver, RoleResolver, UserRoleResolver};
use agora_domain::{
    CommunityId, GlobalScope, RankedRole, RoleAssignment, UserId, badge_variant, display_label,
};
use axum::Json;
use axum::extract::{Path, State};

use crate::dto::{EffectiveRoleResponse, RolesResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_user_roles_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<RolesResponse>> {
    let user_id = UserId::new(user_id)?;
    let assignments = state
        .user_roles
        .list_role_assignments(&user_id, &GlobalScope)
        .await?;

    Ok(Json(roles_response(&assignments)))
}

pub async fn list_member_roles_handler(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<RolesResponse>> {
    let community_id = CommunityId::new(community_id)?;
    let user_id = UserId::new(user_id)?;
    let assignments = state
        .community_roles
        .list_role_assignments(&user_id, &community_id)
        .await?;

    Ok(Json(roles_response(&assignments)))
}

pub async fn user_effective_role_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<EffectiveRoleResponse>> {
    let user_id = UserId::new(user_id)?;
    let resolver = UserRoleResolver::new(state.user_roles, state.diagnostics);

    Ok(Json(resolve_effective(&resolver, user_id, GlobalScope).await))
}

pub async fn member_effective_role_handler(
    State(state): State<AppState>,
    Path((community_id, user_id)): Path<(String, String)>,
) -> ApiResult<Json<EffectiveRoleResponse>> {
    let community_id = CommunityId::new(community_id)?;
    let user_id = UserId::new(user_id)?;
    let resolver = CommunityRoleResolver::new(state.community_roles, state.diagnostics);

    Ok(Json(
        resolve_effective(&resolver, user_id, community_id).await,
    ))
}

fn roles_response<R: RankedRole>(assignments: &[RoleAssignment<R>]) -> RolesResponse {
    RolesResponse {
        roles: assignments
            .iter()
            .map(|assignment| assignment.role.as_str().to_owned())
            .collect(),
    }
}

async fn resolve_effective<R: RankedRole>(
    resolver: &RoleResolver<R>,
    user_id: UserId,
    scope: R::Scope,
) -> EffectiveRoleResponse {
    let role = resolver.resolve(Some(user_id), scope).await.role();

    EffectiveRoleResponse {
        role: role.as_str().to_owned(),
        label: display_label(role),
        badge_variant: badge_variant(role).as_str().to_owned(),
        can_moderate: role.can_moderate(),
    }
}
