//! Async seams between the core and the network.
//!
//! `Transport` executes one `HttpRequest`; hosts plug in whatever HTTP stack
//! they have. `Gateway` is the typed API the controller talks to, and
//! `HttpGateway` implements it by pairing `PixelfedClient` build/parse calls
//! around a `Transport`. Tests substitute `Gateway` directly.

use async_trait::async_trait;

use crate::client::PixelfedClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::session::Session;
use crate::types::{Account, FollowsKind, Relationship, Status};

/// Executes HTTP requests. Non-2xx statuses are returned as data, not as
/// errors; only a missing response is an `Err` (normally
/// `ApiError::Transport`).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// Typed Pixelfed API. Every call completes exactly once.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn verify_credentials(&self, session: &Session) -> Result<Account, ApiError>;

    async fn list_account_posts(
        &self,
        session: &Session,
        account_id: &str,
    ) -> Result<Vec<Status>, ApiError>;

    /// `Ok(None)` when the server reports no relationship with the target.
    async fn check_relationship(
        &self,
        session: &Session,
        target_account_id: &str,
    ) -> Result<Option<Relationship>, ApiError>;

    async fn set_follow(
        &self,
        session: &Session,
        target_account_id: &str,
        desired: bool,
    ) -> Result<Relationship, ApiError>;

    async fn list_follows(
        &self,
        session: &Session,
        account_id: &str,
        kind: FollowsKind,
    ) -> Result<Vec<Account>, ApiError>;
}

/// `Gateway` over any `Transport`.
#[derive(Debug, Clone)]
pub struct HttpGateway<T> {
    transport: T,
}

impl<T: Transport> HttpGateway<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(method = request.method.as_str(), url = %request.path, "request");
        let response = self.transport.execute(request).await?;
        tracing::debug!(status = response.status, "response");
        Ok(response)
    }
}

#[async_trait]
impl<T: Transport> Gateway for HttpGateway<T> {
    async fn verify_credentials(&self, session: &Session) -> Result<Account, ApiError> {
        let client = PixelfedClient::for_session(session);
        let response = self.send(client.build_verify_credentials()).await?;
        client.parse_verify_credentials(response)
    }

    async fn list_account_posts(
        &self,
        session: &Session,
        account_id: &str,
    ) -> Result<Vec<Status>, ApiError> {
        let client = PixelfedClient::for_session(session);
        let response = self.send(client.build_account_posts(account_id)).await?;
        client.parse_account_posts(response)
    }

    async fn check_relationship(
        &self,
        session: &Session,
        target_account_id: &str,
    ) -> Result<Option<Relationship>, ApiError> {
        let client = PixelfedClient::for_session(session);
        let request = client.build_check_relationships(&[target_account_id])?;
        let response = self.send(request).await?;
        client.parse_check_relationships(response, target_account_id)
    }

    async fn set_follow(
        &self,
        session: &Session,
        target_account_id: &str,
        desired: bool,
    ) -> Result<Relationship, ApiError> {
        let client = PixelfedClient::for_session(session);
        let response = self
            .send(client.build_set_follow(target_account_id, desired))
            .await?;
        client.parse_set_follow(response)
    }

    async fn list_follows(
        &self,
        session: &Session,
        account_id: &str,
        kind: FollowsKind,
    ) -> Result<Vec<Account>, ApiError> {
        let client = PixelfedClient::for_session(session);
        let response = self.send(client.build_follows(account_id, kind)).await?;
        client.parse_follows(response)
    }
}
