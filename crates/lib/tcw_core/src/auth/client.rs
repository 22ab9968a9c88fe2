//! Auth client: token exchange, profile fetch and session queries.
//!
//! The client is the single authority on whether a session is valid: it owns
//! the [`SessionStore`] and answers `is_authenticated` from it.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{TimeDelta, Utc};
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, ORIGIN};
use serde::Deserialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{AuthError, jwt};
use crate::config::{AuthConfig, GRANT_TYPE};
use crate::models::auth::{Credentials, RawProfile, SessionRecord, TokenResponse, User};
use crate::profile;
use crate::storage::SessionStore;

/// Token endpoint body before validation.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl TryFrom<TokenPayload> for TokenResponse {
    type Error = AuthError;

    fn try_from(payload: TokenPayload) -> Result<Self, Self::Error> {
        let access_token = payload
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::InvalidResponse("token response has no access_token".into()))?;
        let expires_in = payload
            .expires_in
            .ok_or_else(|| AuthError::InvalidResponse("token response has no expires_in".into()))?;
        Ok(TokenResponse {
            access_token,
            token_type: payload.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_in,
            refresh_token: payload.refresh_token,
            scope: payload.scope,
        })
    }
}

/// HTTP client for the token and profile endpoints, bound to a session store.
pub struct AuthClient {
    http: Client,
    config: AuthConfig,
    store: SessionStore,
    /// Tripped by `logout` and `cancel_in_flight` to abort in-flight
    /// requests. Held while a finished request writes to the store.
    cancel: Mutex<CancellationToken>,
}

impl AuthClient {
    /// Build a client with its own connection pool and the configured timeout.
    pub fn new(config: AuthConfig, store: SessionStore) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(http, config, store))
    }

    /// Build a client around an existing `reqwest::Client`.
    pub fn with_client(http: Client, config: AuthConfig, store: SessionStore) -> Self {
        Self {
            http,
            config,
            store,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Network operations
    // -------------------------------------------------------------------------

    /// Exchange credentials for an access token (OAuth2 password grant).
    pub async fn request_token(&self, credentials: &Credentials) -> Result<TokenResponse, AuthError> {
        let cancel = self.cancel_token();
        self.request_token_with(credentials, &cancel).await
    }

    /// Fetch the raw profile for `token`.
    pub async fn fetch_profile(&self, token: &str) -> Result<RawProfile, AuthError> {
        let cancel = self.cancel_token();
        self.fetch_profile_with(token, &cancel).await
    }

    /// Token exchange, profile fetch, transform and persist. Nothing is stored
    /// unless both requests succeed.
    pub async fn complete_login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.login_session(credentials).await.map(|record| record.user)
    }

    /// Same as [`complete_login`](Self::complete_login), returning the whole
    /// persisted record.
    pub async fn login_session(&self, credentials: &Credentials) -> Result<SessionRecord, AuthError> {
        let cancel = self.cancel_token();
        info!(username = %credentials.username, "starting login flow");

        let token = self.request_token_with(credentials, &cancel).await?;
        info!(token_type = %token.token_type, expires_in = token.expires_in, "access token received");

        let raw = self.fetch_profile_with(&token.access_token, &cancel).await?;
        info!("user profile received");

        let token_expiry = TimeDelta::try_seconds(token.expires_in)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| AuthError::InvalidResponse("expires_in out of range".into()))?;
        let record = SessionRecord {
            user: profile::transform(raw),
            token_expiry,
            token: token.access_token,
        };
        self.commit(&cancel, |store| store.persist(&record))?;

        info!(user_id = %record.user.id, "login flow complete");
        Ok(record)
    }

    /// Re-fetch and re-persist the profile with the stored token.
    pub async fn refresh_profile(&self) -> Result<User, AuthError> {
        let token = self.store.token().ok_or(AuthError::NotAuthenticated)?;
        let cancel = self.cancel_token();
        info!("refreshing user profile");

        let raw = self.fetch_profile_with(&token, &cancel).await?;
        let user = profile::transform(raw);
        self.commit(&cancel, |store| store.set_user(&user))?;
        info!(user_id = %user.id, "user profile refreshed");
        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Session queries
    // -------------------------------------------------------------------------

    /// Clear all persisted session fields and abort in-flight requests.
    /// Idempotent.
    pub fn logout(&self) {
        let _guard = self.trip_cancel();
        self.store.clear();
        info!("session cleared");
    }

    /// Abort in-flight requests without touching the stored session. Requests
    /// started afterwards are unaffected.
    pub fn cancel_in_flight(&self) {
        drop(self.trip_cancel());
        debug!("in-flight auth requests cancelled");
    }

    /// Clear the stored session if it still holds `token`.
    pub fn discard_session(&self, token: &str) {
        let _guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if self.store.token().as_deref() == Some(token) {
            self.store.clear();
            info!("superseded session discarded");
        }
    }

    /// Token and user stored, and the token not expired. An expired token
    /// clears the session before returning `false`.
    pub fn is_authenticated(&self) -> bool {
        let (Some(token), Some(_)) = (self.store.token(), self.store.user()) else {
            return false;
        };
        if jwt::is_expired(&token) {
            info!("access token expired, clearing session");
            self.logout();
            return false;
        }
        true
    }

    pub fn current_user(&self) -> Option<User> {
        if !self.is_authenticated() {
            return None;
        }
        self.store.user()
    }

    pub fn current_token(&self) -> Option<String> {
        if !self.is_authenticated() {
            return None;
        }
        self.store.token()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn cancel_token(&self) -> CancellationToken {
        self.cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cancel the current token and install a fresh one. The returned guard
    /// keeps commits out until it is dropped.
    fn trip_cancel(&self) -> MutexGuard<'_, CancellationToken> {
        let mut cancel = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        cancel.cancel();
        *cancel = CancellationToken::new();
        cancel
    }

    /// Run `write` unless `cancel` was tripped. `logout` takes the same lock,
    /// so a cancelled request never writes after the store was cleared.
    fn commit(
        &self,
        cancel: &CancellationToken,
        write: impl FnOnce(&SessionStore),
    ) -> Result<(), AuthError> {
        let _guard = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if cancel.is_cancelled() {
            return Err(AuthError::Cancelled);
        }
        write(&self.store);
        Ok(())
    }

    async fn request_token_with(
        &self,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> Result<TokenResponse, AuthError> {
        let params = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
            ("client_id", self.config.client_id.as_str()),
            ("grant_type", GRANT_TYPE),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", self.config.scope.as_str()),
        ];

        debug!(url = %self.config.token_endpoint, "token request");
        let request = self
            .http
            .post(&self.config.token_endpoint)
            .header(ACCEPT, "application/json")
            .header(CACHE_CONTROL, "no-cache")
            .form(&params)
            .send();
        let resp = cancellable(cancel, request).await?;

        let status = resp.status();
        let body = cancellable(cancel, resp.bytes()).await?;

        if !status.is_success() {
            let error: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            warn!(status = status.as_u16(), "token request rejected");
            return Err(AuthError::AuthFailed {
                status: status.as_u16(),
                code: text_field(&error, "error"),
                description: text_field(&error, "error_description"),
            });
        }

        let payload: TokenPayload = serde_json::from_slice(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("token response: {e}")))?;
        TokenResponse::try_from(payload)
    }

    async fn fetch_profile_with(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<RawProfile, AuthError> {
        debug!(url = %self.config.profile_endpoint, "profile request");
        let mut request = self
            .http
            .get(&self.config.profile_endpoint)
            .bearer_auth(token)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .header(CACHE_CONTROL, "no-cache");
        if let Some(origin) = &self.config.origin {
            request = request.header(ORIGIN, origin);
        }
        let resp = cancellable(cancel, request.send()).await?;

        let status = resp.status();
        let body = cancellable(cancel, resp.bytes()).await?;

        if !status.is_success() {
            let error: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
            warn!(status = status.as_u16(), "profile request rejected");
            return Err(AuthError::AuthFailed {
                status: status.as_u16(),
                code: text_field(&error, "code"),
                description: text_field(&error, "message"),
            });
        }

        let value: Value = serde_json::from_slice(&body)
            .map_err(|e| AuthError::InvalidResponse(format!("profile response: {e}")))?;
        profile::parse_profile(value)
    }
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("token_endpoint", &self.config.token_endpoint)
            .field("profile_endpoint", &self.config.profile_endpoint)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

/// Race `fut` against `cancel`.
async fn cancellable<T, E>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, E>>,
) -> Result<T, AuthError>
where
    E: Into<AuthError>,
{
    tokio::select! {
        _ = cancel.cancelled() => Err(AuthError::Cancelled),
        res = fut => res.map_err(Into::into),
    }
}

/// String (or number) field of an error body.
fn text_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
