use std::collections::{HashMap, HashSet};

use agora_application::{FollowRepository, RoleAssignmentRepository};
use agora_core::AppResult;
use agora_domain::{
    CommunityId, CommunityRole, FollowMarker, FollowPair, GlobalScope, RoleAssignment,
    ToggleOutcome, UserId, UserRole,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// In-memory community store for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryCommunityStore {
    user_roles: RwLock<HashMap<UserId, Vec<UserRole>>>,
    community_roles: RwLock<HashMap<(CommunityId, UserId), Vec<CommunityRole>>>,
    follows: RwLock<HashSet<FollowPair>>,
}

impl InMemoryCommunityStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grants a platform-wide role. Duplicate grants are kept.
    pub async fn assign_user_role(&self, user_id: UserId, role: UserRole) {
        self.user_roles
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(role);
    }

    /// Grants a role inside a community. Duplicate grants are kept.
    pub async fn assign_community_role(
        &self,
        community_id: CommunityId,
        user_id: UserId,
        role: CommunityRole,
    ) {
        self.community_roles
            .write()
            .await
            .entry((community_id, user_id))
            .or_default()
            .push(role);
    }
}

#[async_trait]
impl RoleAssignmentRepository<UserRole> for InMemoryCommunityStore {
    async fn list_role_assignments(
        &self,
        subject_id: &UserId,
        _scope: &GlobalScope,
    ) -> AppResult<Vec<RoleAssignment<UserRole>>> {
        let user_roles = self.user_roles.read().await;

        Ok(user_roles
            .get(subject_id)
            .map(|roles| {
                roles
                    .iter()
                    .map(|role| RoleAssignment {
                        subject_id: subject_id.clone(),
                        scope: GlobalScope,
                        role: *role,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl RoleAssignmentRepository<CommunityRole> for InMemoryCommunityStore {
    async fn list_role_assignments(
        &self,
        subject_id: &UserId,
        scope: &CommunityId,
    ) -> AppResult<Vec<RoleAssignment<CommunityRole>>> {
        let community_roles = self.community_roles.read().await;

        Ok(community_roles
            .get(&(scope.clone(), subject_id.clone()))
            .map(|roles| {
                roles
                    .iter()
                    .map(|role| RoleAssignment {
                        subject_id: subject_id.clone(),
                        scope: scope.clone(),
                        role: *role,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl FollowRepository for InMemoryCommunityStore {
    async fn check_follow(&self, pair: &FollowPair) -> AppResult<FollowMarker> {
        let follows = self.follows.read().await;

        Ok(if follows.contains(pair) {
            FollowMarker::Follow
        } else {
            FollowMarker::None
        })
    }

    async fn toggle_follow(&self, pair: &FollowPair) -> AppResult<ToggleOutcome> {
        let mut follows = self.follows.write().await;

        if follows.remove(pair) {
            return Ok(ToggleOutcome::Unfollowed);
        }

        follows.insert(pair.clone());
        Ok(ToggleOutcome::Following)
    }
}
