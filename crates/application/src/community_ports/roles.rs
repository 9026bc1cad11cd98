use agora_core::AppResult;
use agora_domain::{RankedRole, RoleAssignment, UserId};
use async_trait::async_trait;

/// Read-only store port for role assignments of one role family.
#[async_trait]
pub trait RoleAssignmentRepository<R: RankedRole>: Send + Sync {
    /// Lists every assignment the subject holds in the scope.
    ///
    /// The result may contain duplicates; callers reduce it.
    async fn list_role_assignments(
        &self,
        subject_id: &UserId,
        scope: &R::Scope,
    ) -> AppResult<Vec<RoleAssignment<R>>>;
}
