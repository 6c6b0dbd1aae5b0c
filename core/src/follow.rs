//! Follow/unfollow state machine.
//!
//! `FollowState` is the source of truth; `FollowButton` is only its
//! rendering. State changes happen on server confirmation, never
//! optimistically, and only one toggle may be in flight at a time.

use crate::error::{ApiError, ErrorKind};
use crate::profile::{Notice, RequestId};
use crate::types::Relationship;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowState {
    /// The relationship has not been (successfully) fetched yet.
    #[default]
    Unknown,
    NotFollowing,
    Following,
}

impl FollowState {
    pub fn from_relationship(relationship: &Relationship) -> Self {
        if relationship.following {
            FollowState::Following
        } else {
            FollowState::NotFollowing
        }
    }

    /// The `set_follow` argument a click asks for; `None` while unknown.
    pub fn desired_on_click(self) -> Option<bool> {
        match self {
            FollowState::Unknown => None,
            FollowState::NotFollowing => Some(true),
            FollowState::Following => Some(false),
        }
    }

    pub fn button(self) -> FollowButton {
        match self {
            FollowState::Unknown => FollowButton::Hidden,
            FollowState::NotFollowing => FollowButton::Follow,
            FollowState::Following => FollowButton::Unfollow,
        }
    }
}

/// What the presentation layer draws for the follow affordance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowButton {
    Hidden,
    Follow,
    Unfollow,
}

impl FollowButton {
    pub fn label(self) -> Option<&'static str> {
        match self {
            FollowButton::Hidden => None,
            FollowButton::Follow => Some("Follow"),
            FollowButton::Unfollow => Some("Unfollow"),
        }
    }

    pub fn is_visible(self) -> bool {
        self != FollowButton::Hidden
    }
}

/// A `set_follow` call that has been issued but not answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingToggle {
    pub request: RequestId,
    pub desired: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleRejection {
    /// The relationship is still unknown; there is nothing to toggle.
    Unknown,
    /// Another toggle is in flight.
    Busy,
}

/// Follow state plus the bookkeeping that keeps it monotonic.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FollowToggle {
    state: FollowState,
    pending: Option<PendingToggle>,
    resolved_by: Option<RequestId>,
}

impl FollowToggle {
    pub fn state(&self) -> FollowState {
        self.state
    }

    pub fn pending(&self) -> Option<PendingToggle> {
        self.pending
    }

    /// Clicks are ignored while busy.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn button(&self) -> FollowButton {
        self.state.button()
    }

    /// Whether an answer to `request` may still change this toggle.
    pub fn accepts(&self, request: RequestId) -> bool {
        self.resolved_by.is_none_or(|seen| request > seen)
    }

    /// Apply a successful relationship lookup. Returns `false` for a stale
    /// or duplicate answer.
    pub fn resolve(&mut self, request: RequestId, relationship: &Relationship) -> bool {
        if !self.accepts(request) {
            return false;
        }
        self.state = FollowState::from_relationship(relationship);
        self.resolved_by = Some(request);
        true
    }

    /// Record a lookup that produced no relationship (empty answer or
    /// failure). The current state is kept.
    pub fn settle_without_relationship(&mut self, request: RequestId) -> bool {
        if !self.accepts(request) {
            return false;
        }
        self.resolved_by = Some(request);
        true
    }

    /// Start a toggle. Returns the `desired` argument for `set_follow`.
    pub fn begin(&mut self, request: RequestId) -> Result<bool, ToggleRejection> {
        if self.pending.is_some() {
            return Err(ToggleRejection::Busy);
        }
        let desired = self
            .state
            .desired_on_click()
            .ok_or(ToggleRejection::Unknown)?;
        self.pending = Some(PendingToggle { request, desired });
        Ok(desired)
    }

    /// Finish the toggle started by `request`.
    ///
    /// `None` when `request` is not the toggle in flight. Otherwise the new
    /// state on success, or the notice to raise with the state unchanged.
    pub fn complete(
        &mut self,
        request: RequestId,
        result: Result<&Relationship, &ApiError>,
    ) -> Option<Result<FollowState, Notice>> {
        let pending = self.pending.filter(|p| p.request == request)?;
        self.pending = None;
        match result {
            Ok(_) => {
                self.state = if pending.desired {
                    FollowState::Following
                } else {
                    FollowState::NotFollowing
                };
                self.resolved_by = Some(request);
                Some(Ok(self.state))
            }
            Err(err) => Some(Err(toggle_failure_notice(pending.desired, err))),
        }
    }
}

fn toggle_failure_notice(desired: bool, err: &ApiError) -> Notice {
    match err.kind() {
        ErrorKind::Auth => Notice::AccessTokenInvalid,
        ErrorKind::Permission => Notice::ActionNotAllowed,
        ErrorKind::Network if desired => Notice::FollowFailed,
        ErrorKind::Network => Notice::UnfollowFailed,
    }
}
