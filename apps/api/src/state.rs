use std::sync::Arc;

use agora_application::{Diagnostics, FollowRepository, RoleAssignmentRepository};
use agora_domain::{CommunityRole, UserRole};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_roles: Arc<dyn RoleAssignmentRepository<UserRole>>,
    pub community_roles: Arc<dyn RoleAssignmentRepository<CommunityRole>>,
    pub follows: Arc<dyn FollowRepository>,
    pub diagnostics: Arc<dyn Diagnostics>,
}

impl AppState {
    /// Wires every port to one store implementing all of them.
    pub fn from_store<S>(store: Arc<S>, diagnostics: Arc<dyn Diagnostics>) -> Self
    where
        S: RoleAssignmentRepository<UserRole>
            + RoleAssignmentRepository<CommunityRole>
            + FollowRepository
            + 'static,
    {
        Self {
            user_roles: store.clone(),
            community_roles: store.clone(),
            follows: store,
            diagnostics,
        }
    }
}
