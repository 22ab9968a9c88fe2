//! Session persistence over a [`KeyValueStore`].
//!
//! Three namespaced keys hold the session: the access token, the serialized
//! user and the computed token expiry (RFC 3339). Backend failures are logged
//! and swallowed here; reads degrade to `None`.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;

use super::{KeyValueStore, StorageError};
use crate::models::auth::{SessionRecord, User};

/// Namespaced session keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKeys {
    pub access_token: String,
    pub user_data: String,
    pub token_expiry: String,
}

impl SessionKeys {
    pub fn new(namespace: &str) -> Self {
        Self {
            access_token: format!("{namespace}_access_token"),
            user_data: format!("{namespace}_user_data"),
            token_expiry: format!("{namespace}_token_expiry"),
        }
    }
}

/// Session store facade. Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn KeyValueStore>,
    keys: SessionKeys,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn KeyValueStore>, namespace: &str) -> Self {
        Self {
            backend,
            keys: SessionKeys::new(namespace),
        }
    }

    pub fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    // -- token ---------------------------------------------------------------

    pub fn token(&self) -> Option<String> {
        self.read(&self.keys.access_token)
            .filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) {
        self.write(&self.keys.access_token, token);
    }

    pub fn remove_token(&self) {
        self.delete(&self.keys.access_token);
    }

    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    // -- user ----------------------------------------------------------------

    pub fn user(&self) -> Option<User> {
        let raw = self.read(&self.keys.user_data)?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %StorageError::from(e), "stored user data unreadable");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(json) => self.write(&self.keys.user_data, &json),
            Err(e) => warn!(error = %e, "failed to serialize user data"),
        }
    }

    pub fn remove_user(&self) {
        self.delete(&self.keys.user_data);
    }

    // -- expiry --------------------------------------------------------------

    pub fn token_expiry(&self) -> Option<DateTime<Utc>> {
        let raw = self.read(&self.keys.token_expiry)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(instant) => Some(instant.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, "stored token expiry unreadable");
                None
            }
        }
    }

    /// Store `now + expires_in_secs` and return the computed instant. An
    /// instant outside chrono's range is logged and nothing is written.
    pub fn set_token_expiry(&self, expires_in_secs: i64) -> Option<DateTime<Utc>> {
        let expiry = TimeDelta::try_seconds(expires_in_secs)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl));
        match expiry {
            Some(expiry) => self.set_token_expiry_at(expiry),
            None => warn!(expires_in_secs, "token expiry out of range, not stored"),
        }
        expiry
    }

    pub fn set_token_expiry_at(&self, expiry: DateTime<Utc>) {
        self.write(&self.keys.token_expiry, &expiry.to_rfc3339());
    }

    pub fn remove_token_expiry(&self) {
        self.delete(&self.keys.token_expiry);
    }

    // -- whole record --------------------------------------------------------

    pub fn persist(&self, record: &SessionRecord) {
        self.set_token(&record.token);
        self.set_token_expiry_at(record.token_expiry);
        self.set_user(&record.user);
    }

    /// The full record, when token, user and expiry are all readable.
    pub fn load(&self) -> Option<SessionRecord> {
        Some(SessionRecord {
            token: self.token()?,
            user: self.user()?,
            token_expiry: self.token_expiry()?,
        })
    }

    pub fn clear(&self) {
        self.remove_token();
        self.remove_user();
        self.remove_token_expiry();
    }

    // -- failure boundary ----------------------------------------------------

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "failed to read from session storage");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            warn!(key, error = %e, "failed to write to session storage");
        }
    }

    fn delete(&self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!(key, error = %e, "failed to remove from session storage");
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}
