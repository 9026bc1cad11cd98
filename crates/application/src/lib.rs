//! Application services and ports.

#![forbid(unsafe_code)]

mod community_ports;
mod follow_toggle;
mod role_resolver;

pub use community_ports::{
    DiagnosticEvent, Diagnostics, FollowRepository, Notice, NoticeKind, RoleAssignmentRepository,
    UserNotifier,
};
pub use follow_toggle::{FollowSnapshot, FollowToggle};
pub use role_resolver::{
    CommunityRoleResolver, RoleQuery, RoleResolver, RoleSnapshot, UserRoleResolver,
};
