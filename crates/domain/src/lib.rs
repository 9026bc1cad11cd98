//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod follow;
mod identity;
mod role;

pub use follow::{FollowMarker, FollowPair, RelationshipState, ToggleOutcome};
pub use identity::{CommunityId, UserId};
pub use role::{
    BadgeVariant, CommunityRole, GlobalScope, RankedRole, RoleAssignment, UserRole,
    badge_variant, display_label, highest_role,
};
