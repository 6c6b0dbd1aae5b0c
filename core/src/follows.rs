//! Followers / following lists opened from the profile counters.

use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::session::Session;
use crate::types::{Account, FollowsKind};

/// Where a counter click navigates to. `account_id == None` means the
/// viewer's own lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowsRoute {
    pub account_id: Option<String>,
    pub kind: FollowsKind,
}

/// Fetch the list behind `route`, resolving the viewer's id first when the
/// route does not name an account and the session does not know it.
pub async fn load_follows<G: Gateway + ?Sized>(
    gateway: &G,
    session: &Session,
    route: &FollowsRoute,
) -> Result<Vec<Account>, ApiError> {
    let account_id = match (&route.account_id, &session.account_id) {
        (Some(id), _) => id.clone(),
        (None, Some(own)) => own.clone(),
        (None, None) => gateway.verify_credentials(session).await?.id,
    };
    tracing::debug!(%account_id, kind = route.kind.path_segment(), "loading follows");
    gateway.list_follows(session, &account_id, route.kind).await
}
