//! Domain DTOs for the Pixelfed account endpoints.
//!
//! # Design
//! Field names follow the Mastodon-compatible JSON Pixelfed serves. Only the
//! `id` fields are required; everything else defaults so that instances that
//! omit a field (or add new ones) still parse. The mock-server crate defines
//! its own copies; integration tests catch schema drift between the two.

use serde::{Deserialize, Serialize};

/// A user account as returned by `verify_credentials`, follower lists and
/// status authors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub acct: String,
    #[serde(default)]
    pub display_name: String,
    /// Avatar image URL.
    #[serde(default)]
    pub avatar: String,
    /// Profile description; HTML, rendered by the presentation layer.
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub statuses_count: u64,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
}

/// The viewer's relationship with one target account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    /// Id of the target account.
    pub id: String,
    pub following: bool,
    #[serde(default)]
    pub followed_by: bool,
    /// A follow request is pending on a locked account.
    #[serde(default)]
    pub requested: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub preview_url: String,
}

/// A post. The profile grid only needs the first attachment's preview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Status {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media_attachments: Vec<Attachment>,
}

impl Status {
    pub fn preview_url(&self) -> Option<&str> {
        self.media_attachments
            .first()
            .map(|a| a.preview_url.as_str())
            .filter(|url| !url.is_empty())
    }
}

/// Request payload for the batch relationships endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipsQuery {
    pub id: Vec<String>,
}

/// Which side of the follow graph to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowsKind {
    Followers,
    Following,
}

impl FollowsKind {
    pub fn path_segment(self) -> &'static str {
        match self {
            FollowsKind::Followers => "followers",
            FollowsKind::Following => "following",
        }
    }
}
