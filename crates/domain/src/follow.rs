use std::str::FromStr;

use agora_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Ordered pair of users a follow relationship is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FollowPair {
    follower_id: UserId,
    followee_id: UserId,
}

impl FollowPair {
    /// Creates a pair, rejecting a user following themselves.
    pub fn new(follower_id: UserId, followee_id: UserId) -> AppResult<Self> {
        if follower_id == followee_id {
            return Err(AppError::Validation(format!(
                "user '{follower_id}' cannot follow themselves"
            )));
        }

        Ok(Self {
            follower_id,
            followee_id,
        })
    }

    /// Returns the user doing the following.
    #[must_use]
    pub fn follower_id(&self) -> &UserId {
        &self.follower_id
    }

    /// Returns the user being followed.
    #[must_use]
    pub fn followee_id(&self) -> &UserId {
        &self.followee_id
    }
}

impl std::fmt::Display for FollowPair {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{} -> {}", self.follower_id, self.followee_id)
    }
}

/// Follow relationship between an ordered pair of users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipState {
    /// The follower does not follow the followee.
    #[default]
    NotFollowing,
    /// The follower follows the followee.
    Following,
}

impl RelationshipState {
    /// Returns whether the state is `Following`.
    #[must_use]
    pub fn is_following(&self) -> bool {
        matches!(self, Self::Following)
    }

    /// Returns a stable transport value for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFollowing => "not_following",
            Self::Following => "following",
        }
    }
}

impl From<&FollowMarker> for RelationshipState {
    fn from(marker: &FollowMarker) -> Self {
        match marker {
            FollowMarker::Follow => Self::Following,
            FollowMarker::None | FollowMarker::Unrecognized(_) => Self::NotFollowing,
        }
    }
}

impl From<ToggleOutcome> for RelationshipState {
    fn from(outcome: ToggleOutcome) -> Self {
        match outcome {
            ToggleOutcome::Following => Self::Following,
            ToggleOutcome::Unfollowed => Self::NotFollowing,
        }
    }
}

/// Value returned by the store when checking a relationship.
///
/// Only the literal `follow` marker means a relationship exists; anything the
/// store sends that is not `follow` or `none` is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FollowMarker {
    /// The relationship exists.
    Follow,
    /// The relationship does not exist.
    None,
    /// The store answered with a value this client does not know.
    Unrecognized(String),
}

impl FollowMarker {
    /// Decodes a store check response. Never fails.
    #[must_use]
    pub fn from_store(value: &str) -> Self {
        match value {
            "follow" => Self::Follow,
            "none" => Self::None,
            other => Self::Unrecognized(other.to_owned()),
        }
    }

    /// Returns the store literal for this marker.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Follow => "follow",
            Self::None => "none",
            Self::Unrecognized(value) => value.as_str(),
        }
    }
}

impl From<RelationshipState> for FollowMarker {
    fn from(state: RelationshipState) -> Self {
        match state {
            RelationshipState::Following => Self::Follow,
            RelationshipState::NotFollowing => Self::None,
        }
    }
}

/// Value returned by the store after an atomic follow toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The follower now follows the followee.
    Following,
    /// The relationship was removed.
    Unfollowed,
}

impl ToggleOutcome {
    /// Returns the store literal for this outcome.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Following => "following",
            Self::Unfollowed => "unfollowed",
        }
    }
}

impl FromStr for ToggleOutcome {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "following" => Ok(Self::Following),
            "unfollowed" => Ok(Self::Unfollowed),
            _ => Err(AppError::Validation(format!(
                "unknown toggle outcome value '{value}'"
            ))),
        }
    }
}
