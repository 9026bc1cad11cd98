//! Role enumerations and their precedence.
//!
//! Each role family is a totally ordered enumeration whose derived `Ord`
//! follows declaration order, lowest precedence first. Reduction of a set of
//! assignments picks the maximum and falls back to the family's lowest role.

use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::str::FromStr;

use agora_core::AppError;
use serde::{Deserialize, Serialize};

use crate::{CommunityId, UserId};

/// Display emphasis used when rendering a role badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeVariant {
    /// Topmost role of the family.
    Primary,
    /// Middle role of the family.
    Secondary,
    /// Every other role.
    Neutral,
}

impl BadgeVariant {
    /// Returns a stable transport value for this variant.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Neutral => "neutral",
        }
    }
}

/// A role family with a fixed, total precedence order.
pub trait RankedRole:
    Copy + Ord + Hash + Debug + FromStr<Err = AppError> + Send + Sync + 'static
{
    /// Scope key the family is assigned in.
    type Scope: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Role every subject holds when nothing else is assigned.
    const LOWEST: Self;

    /// Returns all roles of the family ordered from lowest to highest precedence.
    fn all() -> &'static [Self];

    /// Returns a stable storage value for this role.
    fn as_str(&self) -> &'static str;

    /// Returns whether the role may act on moderation queues.
    fn can_moderate(&self) -> bool;
}

/// Marker scope for platform-wide role assignments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalScope;

impl Display for GlobalScope {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("global")
    }
}

/// Platform-wide user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Regular account.
    Member,
    /// Platform moderator.
    Moderator,
    /// Platform administrator.
    Admin,
}

impl RankedRole for UserRole {
    type Scope = GlobalScope;

    const LOWEST: Self = Self::Member;

    fn all() -> &'static [Self] {
        const ALL: &[UserRole] = &[UserRole::Member, UserRole::Moderator, UserRole::Admin];

        ALL
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    fn can_moderate(&self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

impl FromStr for UserRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "member" => Ok(Self::Member),
            "moderator" => Ok(Self::Moderator),
            "admin" => Ok(Self::Admin),
            _ => Err(AppError::Validation(format!(
                "unknown user role value '{value}'"
            ))),
        }
    }
}

/// Role held inside a single community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityRole {
    /// Community member.
    Member,
    /// Community moderator.
    Moderator,
    /// Community owner.
    Owner,
}

impl RankedRole for CommunityRole {
    type Scope = CommunityId;

    const LOWEST: Self = Self::Member;

    fn all() -> &'static [Self] {
        const ALL: &[CommunityRole] = &[
            CommunityRole::Member,
            CommunityRole::Moderator,
            CommunityRole::Owner,
        ];

        ALL
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Owner => "owner",
        }
    }

    fn can_moderate(&self) -> bool {
        matches!(self, Self::Moderator | Self::Owner)
    }
}

impl FromStr for CommunityRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "member" => Ok(Self::Member),
            "moderator" => Ok(Self::Moderator),
            "owner" => Ok(Self::Owner),
            _ => Err(AppError::Validation(format!(
                "unknown community role value '{value}'"
            ))),
        }
    }
}

/// One role granted to a subject in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment<R: RankedRole> {
    /// Subject holding the role.
    pub subject_id: UserId,
    /// Scope the role applies to.
    pub scope: R::Scope,
    /// Granted role.
    pub role: R,
}

/// Reduces a set of roles to the one with the highest precedence.
///
/// Returns the family's lowest role when the set is empty.
pub fn highest_role<R: RankedRole>(roles: impl IntoIterator<Item = R>) -> R {
    roles.into_iter().max().unwrap_or(R::LOWEST)
}

/// Maps a role to the badge emphasis the rendering layer uses for it.
pub fn badge_variant<R: RankedRole>(role: R) -> BadgeVariant {
    let roles = R::all();
    let top = roles.len().saturating_sub(1);
    match roles.iter().position(|candidate| *candidate == role) {
        Some(index) if index == top => BadgeVariant::Primary,
        Some(index) if index + 1 == top => BadgeVariant::Secondary,
        _ => BadgeVariant::Neutral,
    }
}

/// Returns the human-readable label of a role.
pub fn display_label<R: RankedRole>(role: R) -> String {
    let value = role.as_str();
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
