//! Stateless HTTP request builder and response parser for the Pixelfed
//! account endpoints.
//!
//! # Design
//! `PixelfedClient` holds only the instance URL and the access token. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`. The caller executes
//! the round-trip, keeping this module deterministic and free of I/O.

use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{Account, FollowsKind, Relationship, RelationshipsQuery, Status};

const ACCOUNTS: &str = "/api/v1/accounts";

/// Synchronous, stateless client for one Pixelfed instance and one token.
#[derive(Debug, Clone)]
pub struct PixelfedClient {
    base_url: String,
    access_token: String,
}

impl PixelfedClient {
    pub fn new(base_url: &str, access_token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    pub fn for_session(session: &Session) -> Self {
        Self::new(&session.instance_uri, &session.access_token)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Web page where the user edits their own profile. No API backs it.
    pub fn edit_profile_url(&self) -> String {
        format!("{}/settings/home", self.base_url)
    }

    fn request(&self, method: HttpMethod, endpoint: &str, body: Option<String>) -> HttpRequest {
        let mut headers = vec![(
            "authorization".to_string(),
            format!("Bearer {}", self.access_token),
        )];
        if body.is_some() {
            headers.push(("content-type".to_string(), "application/json".to_string()));
        }
        HttpRequest {
            method,
            path: format!("{}{ACCOUNTS}{endpoint}", self.base_url),
            headers,
            body,
        }
    }

    pub fn build_verify_credentials(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/verify_credentials", None)
    }

    pub fn build_account_posts(&self, account_id: &str) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/{account_id}/statuses"), None)
    }

    pub fn build_check_relationships(&self, account_ids: &[&str]) -> Result<HttpRequest, ApiError> {
        let query = RelationshipsQuery {
            id: account_ids.iter().map(|id| id.to_string()).collect(),
        };
        let body =
            serde_json::to_string(&query).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(self.request(HttpMethod::Post, "/relationships", Some(body)))
    }

    pub fn build_follow(&self, account_id: &str) -> HttpRequest {
        self.request(HttpMethod::Post, &format!("/{account_id}/follow"), None)
    }

    pub fn build_unfollow(&self, account_id: &str) -> HttpRequest {
        self.request(HttpMethod::Post, &format!("/{account_id}/unfollow"), None)
    }

    /// `build_follow` when `desired` is true, `build_unfollow` otherwise.
    pub fn build_set_follow(&self, account_id: &str, desired: bool) -> HttpRequest {
        if desired {
            self.build_follow(account_id)
        } else {
            self.build_unfollow(account_id)
        }
    }

    pub fn build_follows(&self, account_id: &str, kind: FollowsKind) -> HttpRequest {
        self.request(
            HttpMethod::Get,
            &format!("/{account_id}/{}", kind.path_segment()),
            None,
        )
    }

    /// Any failure to resolve the viewer is an authentication problem from
    /// the caller's point of view, so non-200 statuses all map to
    /// `Unauthorized`.
    pub fn parse_verify_credentials(&self, response: HttpResponse) -> Result<Account, ApiError> {
        match check_status(&response) {
            Ok(()) => decode(&response),
            Err(ApiError::HttpError { status, body }) => Err(ApiError::Unauthorized { status, body }),
            Err(ApiError::Forbidden { body }) => Err(ApiError::Unauthorized { status: 403, body }),
            Err(e) => Err(e),
        }
    }

    pub fn parse_account_posts(&self, response: HttpResponse) -> Result<Vec<Status>, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    /// Pick the relationship for `account_id` out of the batch answer.
    /// `None` means the server reported no relationship, which is not an
    /// error.
    pub fn parse_check_relationships(
        &self,
        response: HttpResponse,
        account_id: &str,
    ) -> Result<Option<Relationship>, ApiError> {
        check_status(&response)?;
        let relationships: Vec<Relationship> = decode(&response)?;
        Ok(relationships.into_iter().find(|r| r.id == account_id))
    }

    pub fn parse_set_follow(&self, response: HttpResponse) -> Result<Relationship, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    pub fn parse_follows(&self, response: HttpResponse) -> Result<Vec<Account>, ApiError> {
        check_status(&response)?;
        decode(&response)
    }
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200 => Ok(()),
        401 => Err(ApiError::Unauthorized {
            status: 401,
            body: response.body.clone(),
        }),
        403 => Err(ApiError::Forbidden {
            body: response.body.clone(),
        }),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}
