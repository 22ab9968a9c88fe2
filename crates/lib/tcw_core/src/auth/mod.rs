//! Authentication logic.
//!
//! Token decoding, the HTTP auth client and capability checks over the
//! normalized user record.

pub mod capabilities;
pub mod client;
pub mod jwt;

use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    #[error("Authentication failed with HTTP {status}{}", describe(.code, .description))]
    AuthFailed {
        status: u16,
        code: Option<String>,
        description: Option<String>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request cancelled")]
    Cancelled,
}

fn describe(code: &Option<String>, description: &Option<String>) -> String {
    match (code, description) {
        (_, Some(d)) => format!(": {d}"),
        (Some(c), None) => format!(": {c}"),
        (None, None) => String::new(),
    }
}

impl AuthError {
    /// HTTP status carried by `AuthFailed`.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::AuthFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

/// Map an HTTP status to the message shown next to the login form.
pub fn status_message(status: u16) -> Option<&'static str> {
    let message = match status {
        400 => "Invalid username or password. Please check your credentials.",
        401 => "Authentication failed. Please check your username and password.",
        403 => "Access denied. You do not have permission to access this application.",
        404 => "Authentication service not found. Please try again later.",
        429 => "Too many login attempts. Please wait a few minutes before trying again.",
        500 => "Server error occurred. Please try again later.",
        501..=599 => "Service temporarily unavailable. Please try again later.",
        _ => return None,
    };
    Some(message)
}

/// Short human-readable message for an auth failure.
pub fn user_message(err: &AuthError) -> String {
    match err {
        AuthError::AuthFailed {
            status,
            description,
            ..
        } => status_message(*status)
            .map(str::to_string)
            .or_else(|| description.clone())
            .unwrap_or_else(|| "An unexpected error occurred during authentication.".to_string()),
        AuthError::Network(_) => {
            "Network connection error. Please check your internet connection and try again."
                .to_string()
        }
        _ => "An unexpected error occurred. Please try again.".to_string(),
    }
}
