//! Session client configuration.

use std::time::Duration;

pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://tcwauth.tradecloud1.net/connect/token";
pub const DEFAULT_PROFILE_ENDPOINT: &str = "https://tcwapi.tradecloud1.net/api/user/current";
pub const DEFAULT_CLIENT_ID: &str = "web_client";
pub const DEFAULT_CLIENT_SECRET: &str = "secret";
pub const DEFAULT_SCOPE: &str = "api openid chat";
pub const DEFAULT_ORIGIN: &str = "https://tcw.tradecloud1.net";

/// OAuth2 grant used for the token exchange. Not configurable.
pub const GRANT_TYPE: &str = "password";

/// Default storage key namespace.
pub const DEFAULT_NAMESPACE: &str = "tcw";

/// Default interval between background session checks: 5 minutes.
pub const DEFAULT_REVALIDATE_SECS: u64 = 5 * 60;

/// Default HTTP request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Endpoints, client constants and timing for the auth client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthConfig {
    pub token_endpoint: String,
    pub profile_endpoint: String,
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    /// Prefix for the persisted session keys.
    pub storage_namespace: String,
    /// `Origin` header for profile requests, if any.
    pub origin: Option<String>,
    pub accept_language: String,
    /// How often an authenticated controller re-checks the session.
    pub revalidate_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.into(),
            profile_endpoint: DEFAULT_PROFILE_ENDPOINT.into(),
            client_id: DEFAULT_CLIENT_ID.into(),
            client_secret: DEFAULT_CLIENT_SECRET.into(),
            scope: DEFAULT_SCOPE.into(),
            storage_namespace: DEFAULT_NAMESPACE.into(),
            origin: Some(DEFAULT_ORIGIN.into()),
            accept_language: "en".into(),
            revalidate_interval: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl AuthConfig {
    /// Reads configuration from environment variables, falling back to defaults.
    ///
    /// | Variable                   | Default                        |
    /// |----------------------------|--------------------------------|
    /// | `TCW_TOKEN_ENDPOINT`       | [`DEFAULT_TOKEN_ENDPOINT`]     |
    /// | `TCW_PROFILE_ENDPOINT`     | [`DEFAULT_PROFILE_ENDPOINT`]   |
    /// | `TCW_CLIENT_ID`            | `web_client`                   |
    /// | `TCW_CLIENT_SECRET`        | `secret`                       |
    /// | `TCW_SCOPE`                | `api openid chat`              |
    /// | `TCW_STORAGE_NAMESPACE`    | `tcw`                          |
    /// | `TCW_ORIGIN`               | [`DEFAULT_ORIGIN`] (empty = none) |
    /// | `TCW_ACCEPT_LANGUAGE`      | `en`                           |
    /// | `TCW_REVALIDATE_SECS`      | `300`                          |
    /// | `TCW_REQUEST_TIMEOUT_SECS` | `30`                           |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };
        let secs = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|&n| n > 0)
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let origin = match lookup("TCW_ORIGIN") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v),
            None => defaults.origin.clone(),
        };

        Self {
            token_endpoint: text("TCW_TOKEN_ENDPOINT", defaults.token_endpoint),
            profile_endpoint: text("TCW_PROFILE_ENDPOINT", defaults.profile_endpoint),
            client_id: text("TCW_CLIENT_ID", defaults.client_id),
            client_secret: text("TCW_CLIENT_SECRET", defaults.client_secret),
            scope: text("TCW_SCOPE", defaults.scope),
            storage_namespace: text("TCW_STORAGE_NAMESPACE", defaults.storage_namespace),
            origin,
            accept_language: text("TCW_ACCEPT_LANGUAGE", defaults.accept_language),
            revalidate_interval: secs("TCW_REVALIDATE_SECS", defaults.revalidate_interval),
            request_timeout: secs("TCW_REQUEST_TIMEOUT_SECS", defaults.request_timeout),
        }
    }

    /// Point both endpoints at `base` (`{base}/connect/token`, `{base}/api/user/current`).
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.token_endpoint = format!("{base}/connect/token");
        self.profile_endpoint = format!("{base}/api/user/current");
        self
    }
}
