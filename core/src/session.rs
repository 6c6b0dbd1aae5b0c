//! The single "active user" record.
//!
//! Login and logout live outside this crate; the core only reads the
//! session. `FileSessionStore` still exposes `save` and `clear` so those
//! collaborators share the on-disk format.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Instance URL plus access token identifying the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub instance_uri: String,
    pub access_token: String,
    /// The viewer's own account id, when login recorded it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl Session {
    pub fn new(instance_uri: &str, access_token: &str) -> Self {
        Self {
            instance_uri: instance_uri.to_string(),
            access_token: access_token.to_string(),
            account_id: None,
        }
    }

    pub fn with_account_id(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }
}

pub trait SessionStore: Send + Sync {
    /// The persisted session, or `None` when nobody is logged in.
    fn active_session(&self) -> Result<Option<Session>, SessionError>;
}

/// Holds the session in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    session: Option<Session>,
}

impl MemorySessionStore {
    pub fn new(session: Option<Session>) -> Self {
        Self { session }
    }
}

impl SessionStore for MemorySessionStore {
    fn active_session(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.session.clone())
    }
}

/// Stores the session as one JSON document. A missing file means nobody is
/// logged in.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored session.
    pub fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Remove the stored session. Clearing an empty store is not an error.
    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn active_session(&self) -> Result<Option<Session>, SessionError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }
}
