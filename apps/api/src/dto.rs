use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Raw role literals granted to a subject in one scope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/roles-response.ts"
)]
pub struct RolesResponse {
    pub roles: Vec<String>,
}

/// Highest role of a subject with its presentation hints.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/effective-role-response.ts"
)]
pub struct EffectiveRoleResponse {
    pub role: String,
    pub label: String,
    pub badge_variant: String,
    pub can_moderate: bool,
}

/// Stored follow marker for a pair.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/follow-status-response.ts"
)]
pub struct FollowStatusResponse {
    pub status: String,
}

/// Result of a follow toggle.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/toggle-follow-response.ts"
)]
pub struct ToggleFollowResponse {
    pub result: String,
}
