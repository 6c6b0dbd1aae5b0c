//! Profile view-model and the reducer that builds it.
//!
//! # Design
//! `ProfileViewModel` is an immutable snapshot. Every asynchronous answer is
//! turned into a `ProfileEvent` and folded in with `apply`, which returns the
//! next snapshot plus an optional transient `Notice`. Each answer carries the
//! `RequestId` it was issued under, which makes two rules mechanical:
//!
//! - an answer to a request issued before the current load started (the
//!   `floor`) is discarded, so a superseded profile cannot leak in;
//! - a field resolved by a newer request is never overwritten by an older or
//!   duplicate answer.

use crate::error::ApiError;
use crate::follow::{FollowButton, FollowToggle};
use crate::types::{Account, Relationship, Status};

/// Monotonic tag for every request the controller issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

/// Which profile to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileTarget {
    /// The viewer's own profile, resolved through `verify_credentials`.
    Own,
    /// An account the user navigated to.
    Account(Account),
}

/// One independently loaded part of the screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section<T> {
    Pending,
    Ready(T),
    /// The fetch failed; the section is left empty.
    Unavailable,
}

impl<T> Section<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            Section::Ready(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Slot<T> {
    section: Section<T>,
    resolved_by: Option<RequestId>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            section: Section::Pending,
            resolved_by: None,
        }
    }
}

impl<T> Slot<T> {
    fn accepts(&self, request: RequestId) -> bool {
        self.resolved_by.is_none_or(|seen| request > seen)
    }

    fn resolve(&mut self, request: RequestId, value: T) {
        self.section = Section::Ready(value);
        self.resolved_by = Some(request);
    }

    /// A failure never erases a value that is already shown.
    fn fail(&mut self, request: RequestId) {
        if !matches!(self.section, Section::Ready(_)) {
            self.section = Section::Unavailable;
        }
        self.resolved_by = Some(request);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Waiting for the account (own profile only).
    ResolvingAccount,
    /// The header can be rendered; sections fill in independently.
    Ready,
    /// The viewer's identity could not be resolved. Nothing to show.
    Failed(ApiError),
}

/// Short-lived user-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    IdentityUnavailable,
    PostsUnavailable,
    RelationshipUnavailable,
    AccessTokenInvalid,
    ActionNotAllowed,
    FollowFailed,
    UnfollowFailed,
}

impl Notice {
    pub fn message(self) -> &'static str {
        match self {
            Notice::IdentityUnavailable => "Could not load your profile",
            Notice::PostsUnavailable => "Could not load posts",
            Notice::RelationshipUnavailable => "Could not get follow status",
            Notice::AccessTokenInvalid => "Access token is invalid, please log in again",
            Notice::ActionNotAllowed => "Action not allowed",
            Notice::FollowFailed => "Could not follow this account",
            Notice::UnfollowFailed => "Could not unfollow this account",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEvent {
    AccountResolved {
        request: RequestId,
        account: Account,
        own_profile: bool,
        edit_profile_url: String,
    },
    IdentityFailed {
        request: RequestId,
        error: ApiError,
    },
    PostsLoaded {
        request: RequestId,
        result: Result<Vec<Status>, ApiError>,
    },
    RelationshipLoaded {
        request: RequestId,
        result: Result<Option<Relationship>, ApiError>,
    },
    FollowRequested {
        request: RequestId,
    },
    FollowCompleted {
        request: RequestId,
        result: Result<Relationship, ApiError>,
    },
}

/// Result of `ProfileViewModel::apply`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub view: ProfileViewModel,
    pub notice: Option<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileViewModel {
    floor: RequestId,
    status: LoadStatus,
    account: Option<Account>,
    own_profile: bool,
    edit_profile_url: Option<String>,
    posts: Slot<Vec<Status>>,
    follow: FollowToggle,
}

impl Default for ProfileViewModel {
    fn default() -> Self {
        Self::new(RequestId(0))
    }
}

impl ProfileViewModel {
    /// Empty snapshot for a load whose first request will be `floor`.
    pub fn new(floor: RequestId) -> Self {
        Self {
            floor,
            status: LoadStatus::ResolvingAccount,
            account: None,
            own_profile: false,
            edit_profile_url: None,
            posts: Slot::default(),
            follow: FollowToggle::default(),
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn account(&self) -> Option<&Account> {
        self.account.as_ref()
    }

    pub fn is_own_profile(&self) -> bool {
        self.own_profile
    }

    pub fn posts(&self) -> &Section<Vec<Status>> {
        &self.posts.section
    }

    pub fn follow(&self) -> &FollowToggle {
        &self.follow
    }

    /// Hidden on the viewer's own profile, whatever the toggle says.
    pub fn follow_button(&self) -> FollowButton {
        if self.own_profile || self.account.is_none() {
            return FollowButton::Hidden;
        }
        self.follow.button()
    }

    /// Only set on the viewer's own profile.
    pub fn edit_profile_url(&self) -> Option<&str> {
        self.edit_profile_url.as_deref()
    }

    fn is_current(&self, request: RequestId) -> bool {
        request >= self.floor
    }

    fn awaits_identity(&self) -> bool {
        self.status == LoadStatus::ResolvingAccount
    }

    pub fn apply(&self, event: ProfileEvent) -> Transition {
        let mut view = self.clone();
        let notice = view.reduce(event);
        Transition { view, notice }
    }

    fn reduce(&mut self, event: ProfileEvent) -> Option<Notice> {
        match event {
            ProfileEvent::AccountResolved {
                request,
                account,
                own_profile,
                edit_profile_url,
            } => {
                if !self.is_current(request) || !self.awaits_identity() {
                    return None;
                }
                self.account = Some(account);
                self.own_profile = own_profile;
                self.edit_profile_url = own_profile.then_some(edit_profile_url);
                self.status = LoadStatus::Ready;
                None
            }
            ProfileEvent::IdentityFailed { request, error } => {
                if !self.is_current(request) || !self.awaits_identity() {
                    return None;
                }
                self.status = LoadStatus::Failed(error);
                Some(Notice::IdentityUnavailable)
            }
            ProfileEvent::PostsLoaded { request, result } => {
                if !self.is_current(request) || !self.posts.accepts(request) {
                    return None;
                }
                match result {
                    Ok(posts) => {
                        self.posts.resolve(request, posts);
                        None
                    }
                    Err(_) => {
                        self.posts.fail(request);
                        Some(Notice::PostsUnavailable)
                    }
                }
            }
            ProfileEvent::RelationshipLoaded { request, result } => {
                if !self.is_current(request) || self.own_profile {
                    return None;
                }
                match result {
                    Ok(Some(relationship)) => {
                        self.follow.resolve(request, &relationship);
                        None
                    }
                    Ok(None) => {
                        self.follow.settle_without_relationship(request);
                        None
                    }
                    Err(_) => self
                        .follow
                        .settle_without_relationship(request)
                        .then_some(Notice::RelationshipUnavailable),
                }
            }
            ProfileEvent::FollowRequested { request } => {
                if self.own_profile || self.account.is_none() || !self.is_current(request) {
                    return None;
                }
                // Rejections (unknown state, toggle in flight) are silent.
                let _ = self.follow.begin(request);
                None
            }
            ProfileEvent::FollowCompleted { request, result } => {
                match self.follow.complete(request, result.as_ref())? {
                    Ok(_) => None,
                    Err(notice) => Some(notice),
                }
            }
        }
    }
}
