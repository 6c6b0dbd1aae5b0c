//! Drives the profile workflow against a `Gateway`.
//!
//! # Design
//! The controller owns the current `ProfileViewModel` inside a `watch`
//! channel and folds every gateway answer into it through
//! `ProfileViewModel::apply`, so the presentation layer only ever sees whole
//! snapshots. Transient notices go out on a separate unbounded channel.
//!
//! A load runs on the caller's task: the posts and relationship fetches are
//! joined, and each publishes its answer the moment it completes. Starting a
//! new load or calling `teardown` aborts the running one. Every event,
//! identity included, carries a request id, and the fresh snapshot's floor
//! discards answers issued by an older load.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use futures::future::{self, AbortHandle, Abortable};
use tokio::sync::{mpsc, watch};

use crate::client::PixelfedClient;
use crate::error::ApiError;
use crate::follow::{FollowButton, FollowState};
use crate::follows::FollowsRoute;
use crate::gateway::Gateway;
use crate::profile::{Notice, ProfileEvent, ProfileTarget, ProfileViewModel, RequestId};
use crate::session::{Session, SessionStore};
use crate::types::FollowsKind;

/// Receiving ends handed to the presentation layer.
#[derive(Debug)]
pub struct ProfileUpdates {
    pub view: watch::Receiver<ProfileViewModel>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Completed,
    /// Superseded by another load or torn down.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Nothing to toggle, or a toggle is already in flight.
    Ignored,
    Changed(FollowState),
    Failed(ApiError),
}

/// User actions emitted by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileIntent {
    FollowClicked,
    UnfollowClicked,
    ViewFollowers,
    ViewFollowing,
    EditProfile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentOutcome {
    Toggle(ToggleOutcome),
    Navigate(FollowsRoute),
    /// Open in the system browser.
    OpenUrl(String),
    Ignored,
}

pub struct ProfileController<G> {
    gateway: G,
    session: Session,
    viewer_id: OnceLock<String>,
    next_request: AtomicU64,
    view: watch::Sender<ProfileViewModel>,
    notices: mpsc::UnboundedSender<Notice>,
    inflight: Mutex<Option<AbortHandle>>,
}

impl<G: Gateway> ProfileController<G> {
    pub fn new(gateway: G, session: Session) -> (Self, ProfileUpdates) {
        let (view_tx, view_rx) = watch::channel(ProfileViewModel::default());
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let viewer_id = OnceLock::new();
        if let Some(id) = &session.account_id {
            let _ = viewer_id.set(id.clone());
        }
        let controller = Self {
            gateway,
            session,
            viewer_id,
            next_request: AtomicU64::new(1),
            view: view_tx,
            notices: notice_tx,
            inflight: Mutex::new(None),
        };
        let updates = ProfileUpdates {
            view: view_rx,
            notices: notice_rx,
        };
        (controller, updates)
    }

    /// Build a controller for the active session. An empty or unreadable
    /// store means nobody is logged in.
    pub fn from_store(
        gateway: G,
        store: &dyn SessionStore,
    ) -> Result<(Self, ProfileUpdates), ApiError> {
        match store.active_session() {
            Ok(Some(session)) => Ok(Self::new(gateway, session)),
            Ok(None) => Err(ApiError::NoSession),
            Err(err) => {
                tracing::warn!(%err, "session store unreadable");
                Err(ApiError::NoSession)
            }
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn snapshot(&self) -> ProfileViewModel {
        self.view.borrow().clone()
    }

    fn issue(&self) -> RequestId {
        RequestId(self.next_request.fetch_add(1, Ordering::Relaxed))
    }

    fn inflight(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ProfileEvent) {
        let mut notice = None;
        self.view.send_if_modified(|vm| {
            let transition = vm.apply(event);
            notice = transition.notice;
            let changed = transition.view != *vm;
            *vm = transition.view;
            changed
        });
        if let Some(notice) = notice {
            tracing::debug!(?notice, "notice raised");
            let _ = self.notices.send(notice);
        }
    }

    /// Load `target` into a fresh snapshot. Only a failure to resolve the
    /// viewer's own account is returned as an error; section failures show
    /// up as notices.
    pub async fn load(&self, target: ProfileTarget) -> Result<LoadOutcome, ApiError> {
        let (handle, registration) = AbortHandle::new_pair();
        if let Some(previous) = self.inflight().replace(handle) {
            previous.abort();
        }
        let floor = RequestId(self.next_request.load(Ordering::Relaxed));
        self.view.send_replace(ProfileViewModel::new(floor));

        match Abortable::new(self.run_load(target), registration).await {
            Ok(result) => result.map(|()| LoadOutcome::Completed),
            Err(_aborted) => {
                tracing::debug!("profile load cancelled");
                Ok(LoadOutcome::Cancelled)
            }
        }
    }

    /// Abort the running load, if any.
    pub fn teardown(&self) {
        if let Some(handle) = self.inflight().take() {
            handle.abort();
        }
    }

    async fn run_load(&self, target: ProfileTarget) -> Result<(), ApiError> {
        let identity = self.issue();
        let (account, own_profile) = match target {
            ProfileTarget::Own => match self.gateway.verify_credentials(&self.session).await {
                Ok(account) => {
                    self.remember_viewer(&account.id);
                    (account, Some(true))
                }
                Err(err) => {
                    tracing::warn!(%err, "cannot resolve own account");
                    let err = err.into_identity_failure();
                    self.publish(ProfileEvent::IdentityFailed {
                        request: identity,
                        error: err.clone(),
                    });
                    return Err(err);
                }
            },
            ProfileTarget::Account(account) => {
                let own = self.viewer_id.get().map(|viewer| *viewer == account.id);
                (account, own)
            }
        };

        let account_id = account.id.clone();
        self.publish(ProfileEvent::AccountResolved {
            request: identity,
            account,
            own_profile: own_profile == Some(true),
            edit_profile_url: PixelfedClient::for_session(&self.session).edit_profile_url(),
        });

        let posts_request = self.issue();
        let relationship_request = (own_profile != Some(true)).then(|| self.issue());

        let posts = self.fetch_posts(posts_request, &account_id);
        let relationship = async {
            if let Some(request) = relationship_request {
                self.fetch_relationship(request, &account_id, own_profile.is_none())
                    .await;
            }
        };
        future::join(posts, relationship).await;

        tracing::info!(%account_id, "profile loaded");
        Ok(())
    }

    async fn fetch_posts(&self, request: RequestId, account_id: &str) {
        let result = self
            .gateway
            .list_account_posts(&self.session, account_id)
            .await;
        if let Err(err) = &result {
            tracing::warn!(%err, %account_id, "posts unavailable");
        }
        self.publish(ProfileEvent::PostsLoaded { request, result });
    }

    async fn fetch_relationship(&self, request: RequestId, account_id: &str, check_owner: bool) {
        if check_owner {
            match self.resolve_viewer_id().await {
                Ok(viewer) if viewer == account_id => {
                    tracing::debug!(%account_id, "own account, no relationship");
                    return;
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(%err, "cannot tell whether this is the viewer's account");
                    self.publish(ProfileEvent::RelationshipLoaded {
                        request,
                        result: Err(err),
                    });
                    return;
                }
            }
        }
        let result = self
            .gateway
            .check_relationship(&self.session, account_id)
            .await;
        if let Err(err) = &result {
            tracing::warn!(%err, %account_id, "relationship unavailable");
        }
        self.publish(ProfileEvent::RelationshipLoaded { request, result });
    }

    fn remember_viewer(&self, id: &str) {
        let _ = self.viewer_id.set(id.to_string());
    }

    async fn resolve_viewer_id(&self) -> Result<String, ApiError> {
        if let Some(id) = self.viewer_id.get() {
            return Ok(id.clone());
        }
        let account = self.gateway.verify_credentials(&self.session).await?;
        self.remember_viewer(&account.id);
        Ok(account.id)
    }

    /// Follow or unfollow the displayed account, depending on the current
    /// state. Clicks while the state is unknown or another toggle is in
    /// flight are ignored.
    pub async fn toggle_follow(&self) -> ToggleOutcome {
        let request = self.issue();
        let mut started = None;
        self.view.send_if_modified(|vm| {
            let next = vm.apply(ProfileEvent::FollowRequested { request }).view;
            started = next
                .follow()
                .pending()
                .filter(|p| p.request == request)
                .zip(next.account())
                .map(|(p, account)| (account.id.clone(), p.desired));
            let changed = started.is_some();
            *vm = next;
            changed
        });
        let Some((target, desired)) = started else {
            tracing::debug!("follow click ignored");
            return ToggleOutcome::Ignored;
        };

        let result = self.gateway.set_follow(&self.session, &target, desired).await;
        let outcome = match &result {
            Ok(_) if desired => ToggleOutcome::Changed(FollowState::Following),
            Ok(_) => ToggleOutcome::Changed(FollowState::NotFollowing),
            Err(err) => {
                tracing::warn!(%err, %target, desired, "follow toggle failed");
                ToggleOutcome::Failed(err.clone())
            }
        };
        self.publish(ProfileEvent::FollowCompleted { request, result });
        outcome
    }

    pub async fn handle(&self, intent: ProfileIntent) -> IntentOutcome {
        let view = self.snapshot();
        match intent {
            ProfileIntent::FollowClicked if view.follow_button() == FollowButton::Follow => {
                IntentOutcome::Toggle(self.toggle_follow().await)
            }
            ProfileIntent::UnfollowClicked if view.follow_button() == FollowButton::Unfollow => {
                IntentOutcome::Toggle(self.toggle_follow().await)
            }
            ProfileIntent::FollowClicked | ProfileIntent::UnfollowClicked => IntentOutcome::Ignored,
            ProfileIntent::ViewFollowers => follows_route(&view, FollowsKind::Followers),
            ProfileIntent::ViewFollowing => follows_route(&view, FollowsKind::Following),
            ProfileIntent::EditProfile => view
                .edit_profile_url()
                .map(|url| IntentOutcome::OpenUrl(url.to_string()))
                .unwrap_or(IntentOutcome::Ignored),
        }
    }
}

fn follows_route(view: &ProfileViewModel, kind: FollowsKind) -> IntentOutcome {
    match view.account() {
        Some(account) => IntentOutcome::Navigate(FollowsRoute {
            account_id: Some(account.id.clone()),
            kind,
        }),
        None => IntentOutcome::Ignored,
    }
}
