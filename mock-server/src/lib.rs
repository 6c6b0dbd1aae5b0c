//! In-memory Pixelfed instance serving the account endpoints the profile
//! screen uses.
//!
//! Every route requires `Authorization: Bearer <token>`; unknown tokens get
//! 401. Following yourself, or an account marked as restricted, gets 403.
//! Counters on returned accounts are computed from the follow graph and the
//! stored statuses.

pub mod config;

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;

pub const VIEWER_ID: &str = "42";
pub const VIEWER_TOKEN: &str = "token-42";
/// Seeded account with two posts that the viewer does not follow.
pub const PHOTOGRAPHER_ID: &str = "7";
/// Seeded account that refuses new followers.
pub const RESTRICTED_ID: &str = "8";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub username: String,
    pub acct: String,
    pub display_name: String,
    pub avatar: String,
    pub note: String,
    pub url: String,
    pub statuses_count: u64,
    pub followers_count: u64,
    pub following_count: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub following: bool,
    pub followed_by: bool,
    pub requested: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub preview_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub content: String,
    pub media_attachments: Vec<Attachment>,
}

#[derive(Deserialize)]
pub struct RelationshipsQuery {
    pub id: Vec<String>,
}

#[derive(Debug, Default)]
pub struct Instance {
    base_url: String,
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, String>,
    statuses: HashMap<String, Vec<Status>>,
    /// (follower, followed)
    follows: BTreeSet<(String, String)>,
    restricted: BTreeSet<String>,
}

impl Instance {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Viewer `42`, photographer `7` with two posts, restricted `8` that the
    /// viewer already follows.
    pub fn seeded() -> Self {
        let mut instance = Self::new("https://pixelfed.test");
        instance.add_account(VIEWER_ID, "alice", "Alice");
        instance.add_token(VIEWER_TOKEN, VIEWER_ID);
        instance.add_account(PHOTOGRAPHER_ID, "bob", "Bob");
        instance.add_status(PHOTOGRAPHER_ID, "101");
        instance.add_status(PHOTOGRAPHER_ID, "102");
        instance.add_account(RESTRICTED_ID, "carol", "Carol");
        instance.restrict(RESTRICTED_ID);
        instance.follow(VIEWER_ID, RESTRICTED_ID);
        instance.follow(PHOTOGRAPHER_ID, VIEWER_ID);
        instance
    }

    pub fn add_account(&mut self, id: &str, username: &str, display_name: &str) {
        let account = Account {
            id: id.to_string(),
            username: username.to_string(),
            acct: username.to_string(),
            display_name: display_name.to_string(),
            avatar: format!("{}/storage/avatars/{id}.jpg", self.base_url),
            note: format!("<p>{display_name}'s photos</p>"),
            url: format!("{}/{username}", self.base_url),
            statuses_count: 0,
            followers_count: 0,
            following_count: 0,
        };
        self.accounts.insert(id.to_string(), account);
    }

    pub fn add_token(&mut self, token: &str, account_id: &str) {
        self.tokens.insert(token.to_string(), account_id.to_string());
    }

    pub fn add_status(&mut self, account_id: &str, status_id: &str) {
        let status = Status {
            id: status_id.to_string(),
            content: format!("<p>post {status_id}</p>"),
            media_attachments: vec![Attachment {
                id: format!("m{status_id}"),
                kind: "image".to_string(),
                url: format!("{}/storage/m/{status_id}.jpg", self.base_url),
                preview_url: format!("{}/storage/m/{status_id}_thumb.jpg", self.base_url),
            }],
        };
        self.statuses
            .entry(account_id.to_string())
            .or_default()
            .push(status);
    }

    pub fn follow(&mut self, follower: &str, followed: &str) {
        self.follows
            .insert((follower.to_string(), followed.to_string()));
    }

    pub fn restrict(&mut self, account_id: &str) {
        self.restricted.insert(account_id.to_string());
    }

    fn viewer(&self, headers: &HeaderMap) -> Result<String, StatusCode> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }

    fn account(&self, id: &str) -> Option<Account> {
        let mut account = self.accounts.get(id)?.clone();
        account.statuses_count = self.statuses.get(id).map_or(0, |s| s.len() as u64);
        account.followers_count = self.follows.iter().filter(|(_, b)| b == id).count() as u64;
        account.following_count = self.follows.iter().filter(|(a, _)| a == id).count() as u64;
        Some(account)
    }

    fn relationship(&self, viewer: &str, target: &str) -> Relationship {
        Relationship {
            id: target.to_string(),
            following: self
                .follows
                .contains(&(viewer.to_string(), target.to_string())),
            followed_by: self
                .follows
                .contains(&(target.to_string(), viewer.to_string())),
            requested: false,
        }
    }
}

pub type Db = Arc<RwLock<Instance>>;

pub fn app() -> Router {
    app_with(Instance::seeded())
}

pub fn app_with(instance: Instance) -> Router {
    let db: Db = Arc::new(RwLock::new(instance));
    Router::new()
        .route("/api/v1/accounts/verify_credentials", get(verify_credentials))
        .route("/api/v1/accounts/relationships", post(relationships))
        .route("/api/v1/accounts/{id}/statuses", get(account_statuses))
        .route("/api/v1/accounts/{id}/follow", post(follow))
        .route("/api/v1/accounts/{id}/unfollow", post(unfollow))
        .route("/api/v1/accounts/{id}/followers", get(followers))
        .route("/api/v1/accounts/{id}/following", get(following))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn verify_credentials(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Account>, StatusCode> {
    let db = db.read().await;
    let viewer = db.viewer(&headers)?;
    db.account(&viewer).map(Json).ok_or(StatusCode::UNAUTHORIZED)
}

async fn account_statuses(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Status>>, StatusCode> {
    let db = db.read().await;
    db.viewer(&headers)?;
    if !db.accounts.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(db.statuses.get(&id).cloned().unwrap_or_default()))
}

async fn relationships(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(query): Json<RelationshipsQuery>,
) -> Result<Json<Vec<Relationship>>, StatusCode> {
    let db = db.read().await;
    let viewer = db.viewer(&headers)?;
    let relationships = query
        .id
        .iter()
        .filter(|id| db.accounts.contains_key(*id))
        .map(|id| db.relationship(&viewer, id))
        .collect();
    Ok(Json(relationships))
}

async fn follow(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Relationship>, StatusCode> {
    let mut db = db.write().await;
    let viewer = db.viewer(&headers)?;
    if !db.accounts.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    if id == viewer || db.restricted.contains(&id) {
        tracing::info!(%viewer, target = %id, "follow refused");
        return Err(StatusCode::FORBIDDEN);
    }
    db.follow(&viewer, &id);
    Ok(Json(db.relationship(&viewer, &id)))
}

async fn unfollow(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Relationship>, StatusCode> {
    let mut db = db.write().await;
    let viewer = db.viewer(&headers)?;
    if !db.accounts.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    db.follows.remove(&(viewer.clone(), id.clone()));
    Ok(Json(db.relationship(&viewer, &id)))
}

async fn followers(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Account>>, StatusCode> {
    let db = db.read().await;
    db.viewer(&headers)?;
    if !db.accounts.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let accounts = db
        .follows
        .iter()
        .filter(|(_, followed)| *followed == id)
        .filter_map(|(follower, _)| db.account(follower))
        .collect();
    Ok(Json(accounts))
}

async fn following(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Vec<Account>>, StatusCode> {
    let db = db.read().await;
    db.viewer(&headers)?;
    if !db.accounts.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let accounts = db
        .follows
        .iter()
        .filter(|(follower, _)| *follower == id)
        .filter_map(|(_, followed)| db.account(followed))
        .collect();
    Ok(Json(accounts))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_counters_follow_the_graph() {
        let instance = Instance::seeded();
        let viewer = instance.account(VIEWER_ID).unwrap();
        assert_eq!(viewer.following_count, 1);
        assert_eq!(viewer.followers_count, 1);
        let bob = instance.account(PHOTOGRAPHER_ID).unwrap();
        assert_eq!(bob.statuses_count, 2);
    }

    #[test]
    fn viewer_requires_known_bearer_token() {
        let instance = Instance::seeded();
        let mut headers = HeaderMap::new();
        assert_eq!(instance.viewer(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(AUTHORIZATION, "Bearer nope".parse().unwrap());
        assert_eq!(instance.viewer(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(AUTHORIZATION, format!("Bearer {VIEWER_TOKEN}").parse().unwrap());
        assert_eq!(instance.viewer(&headers), Ok(VIEWER_ID.to_string()));
    }

    #[test]
    fn relationship_reports_both_directions() {
        let instance = Instance::seeded();
        let rel = instance.relationship(VIEWER_ID, PHOTOGRAPHER_ID);
        assert!(!rel.following);
        assert!(rel.followed_by);
        let rel = instance.relationship(VIEWER_ID, RESTRICTED_ID);
        assert!(rel.following);
    }

    #[test]
    fn status_serializes_attachment_type() {
        let mut instance = Instance::new("https://x.test/");
        instance.add_account("1", "u", "U");
        instance.add_status("1", "9");
        let json = serde_json::to_value(&instance.statuses["1"][0]).unwrap();
        assert_eq!(json["media_attachments"][0]["type"], "image");
        assert_eq!(
            json["media_attachments"][0]["preview_url"],
            "https://x.test/storage/m/9_thumb.jpg"
        );
    }
}
