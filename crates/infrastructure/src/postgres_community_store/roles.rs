use std::str::FromStr;

use agora_application::RoleAssignmentRepository;
use agora_core::{AppError, AppResult};
use agora_domain::{
    CommunityId, CommunityRole, GlobalScope, RankedRole, RoleAssignment, UserId, UserRole,
};
use async_trait::async_trait;

use super::{PostgresCommunityStore, store_error};

fn decode_role<R: RankedRole>(value: &str, subject_id: &UserId) -> AppResult<R> {
    R::from_str(value).map_err(|error| {
        AppError::Internal(format!(
            "failed to decode role '{value}' for subject '{subject_id}': {error}"
        ))
    })
}

#[async_trait]
impl RoleAssignmentRepository<UserRole> for PostgresCommunityStore {
    async fn list_role_assignments(
        &self,
        subject_id: &UserId,
        _scope: &GlobalScope,
    ) -> AppResult<Vec<RoleAssignment<UserRole>>> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            "#,
        )
        .bind(subject_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to load user roles", error))?;

        roles
            .iter()
            .map(|role| {
                Ok(RoleAssignment {
                    subject_id: subject_id.clone(),
                    scope: GlobalScope,
                    role: decode_role(role.as_str(), subject_id)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RoleAssignmentRepository<CommunityRole> for PostgresCommunityStore {
    async fn list_role_assignments(
        &self,
        subject_id: &UserId,
        scope: &CommunityId,
    ) -> AppResult<Vec<RoleAssignment<CommunityRole>>> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM community_members
            WHERE community_id = $1
                AND user_id = $2
            "#,
        )
        .bind(scope.as_str())
        .bind(subject_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| store_error("failed to load community roles", error))?;

        roles
            .iter()
            .map(|role| {
                Ok(RoleAssignment {
                    subject_id: subject_id.clone(),
                    scope: scope.clone(),
                    role: decode_role(role.as_str(), subject_id)?,
                })
            })
            .collect()
    }
}
