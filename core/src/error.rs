//! Error types for the Pixelfed client core.
//!
//! # Design
//! `401` and `403` get dedicated variants because the profile screen reacts
//! to them differently (re-login vs. "action not allowed"). All other non-200
//! responses land in `HttpError` with the raw status code and body.
//! `ErrorKind` folds the variants into the three categories the
//! presentation layer distinguishes.

use thiserror::Error;

/// Errors returned by `PixelfedClient` parse methods and by `Gateway` calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No active session is stored; the user is not logged in.
    #[error("no active session")]
    NoSession,

    /// The server returned 401, or `verify_credentials` failed.
    #[error("unauthorized (HTTP {status}): {body}")]
    Unauthorized { status: u16, body: String },

    /// The server returned 403 for an action.
    #[error("action not allowed: {body}")]
    Forbidden { body: String },

    /// Any other non-200 status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connection, DNS, TLS, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),
}

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing session or invalid/expired token.
    Auth,
    /// The server refused this particular action.
    Permission,
    /// Everything else, including malformed responses.
    Network,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NoSession | ApiError::Unauthorized { .. } => ErrorKind::Auth,
            ApiError::Forbidden { .. } => ErrorKind::Permission,
            ApiError::HttpError { .. }
            | ApiError::Transport(_)
            | ApiError::DeserializationError(_)
            | ApiError::SerializationError(_) => ErrorKind::Network,
        }
    }

    /// HTTP status behind this error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized { status, .. } | ApiError::HttpError { status, .. } => {
                Some(*status)
            }
            ApiError::Forbidden { .. } => Some(403),
            _ => None,
        }
    }

    /// Any failure to resolve the viewer's own account is an auth failure.
    /// Errors without a response keep status `0`.
    pub fn into_identity_failure(self) -> ApiError {
        if self.kind() == ErrorKind::Auth {
            return self;
        }
        ApiError::Unauthorized {
            status: self.status().unwrap_or(0),
            body: self.to_string(),
        }
    }
}

/// Errors raised by a `SessionStore`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt session record: {0}")]
    Corrupt(#[from] serde_json::Error),
}
