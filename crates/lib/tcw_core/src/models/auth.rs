//! Authentication domain models.
//!
//! Wire-facing payloads (`TokenResponse`, `RawProfile`, `MenuItem`) follow the
//! remote API's field naming; `User` and `SessionRecord` are the internal,
//! persisted shapes.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username/password pair submitted by the login form.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Successful response from the OAuth2 token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Claims carried in the payload segment of an access token.
///
/// Every field is optional: the issuer decides what to embed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenClaims {
    /// Subject (user ID).
    pub sub: Option<String>,
    pub iss: Option<String>,
    /// Audience; a single string or a list.
    pub aud: Option<serde_json::Value>,
    /// Expiry (unix timestamp, seconds).
    pub exp: Option<i64>,
    /// Issued at (unix timestamp, seconds).
    pub iat: Option<i64>,
    pub nbf: Option<i64>,
    pub jti: Option<String>,
    pub client_id: Option<String>,
    /// Granted scopes; a space-separated string or a list.
    pub scope: Option<serde_json::Value>,
    pub id: Option<StringOrNumber>,
    #[serde(rename = "Platform")]
    pub platform: Option<String>,
    pub locale: Option<String>,
    pub auth_time: Option<i64>,
    pub idp: Option<String>,
    pub amr: Option<Vec<String>>,
}

/// Identifier that some backend versions send as a number and others as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Number(i64),
    Text(String),
}

impl fmt::Display for StringOrNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringOrNumber::Number(n) => write!(f, "{n}"),
            StringOrNumber::Text(s) => f.write_str(s),
        }
    }
}

/// Menu classifier reported by the rich profile shape.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum MenuType {
    Main,
    Popup,
    Workflow,
    #[default]
    Unknown,
    Other(i64),
}

impl MenuType {
    /// Lowercase label used to namespace derived permissions.
    pub fn label(self) -> &'static str {
        match self {
            MenuType::Main => "main",
            MenuType::Popup => "popup",
            MenuType::Workflow => "workflow",
            MenuType::Unknown | MenuType::Other(_) => "other",
        }
    }
}

impl From<i64> for MenuType {
    fn from(value: i64) -> Self {
        match value {
            1 => MenuType::Main,
            2 => MenuType::Popup,
            3 => MenuType::Workflow,
            0 => MenuType::Unknown,
            other => MenuType::Other(other),
        }
    }
}

impl From<MenuType> for i64 {
    fn from(value: MenuType) -> Self {
        match value {
            MenuType::Main => 1,
            MenuType::Popup => 2,
            MenuType::Workflow => 3,
            MenuType::Unknown => 0,
            MenuType::Other(n) => n,
        }
    }
}

/// A named, typed, orderable capability descriptor from the profile endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    #[serde(default)]
    pub id: i64,
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub menu_type: MenuType,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_available: bool,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl MenuItem {
    /// Active and available: the item grants access.
    pub fn is_usable(&self) -> bool {
        self.is_active && self.is_available
    }
}

/// Profile payload as returned by the profile endpoint (after envelope unwrapping).
///
/// Accepts both the flat shape (string id, string roles, permission list) and
/// the rich shape (numeric id, integer roles, menu items).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    pub id: Option<StringOrNumber>,
    #[serde(alias = "userName")]
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub platform: Option<String>,
    pub locale: Option<String>,
    pub roles: Option<Vec<StringOrNumber>>,
    pub permissions: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub last_login_at: Option<String>,
    pub company_id: Option<StringOrNumber>,
    pub company_name: Option<String>,
    pub profile_picture: Option<serde_json::Value>,
    pub menu_items: Option<Vec<MenuItem>>,
}

/// Normalized user record.
///
/// Pure data: capability checks live in [`crate::auth::capabilities`] and take
/// a `&User`, so a persisted record reads back with identical behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub display_name: String,
    pub initials: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub menu_items: Vec<MenuItem>,
}

/// Everything persisted for one signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub token: String,
    pub user: User,
    pub token_expiry: DateTime<Utc>,
}
