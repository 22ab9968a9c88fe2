//! Browser bindings for the pure parts of `tcw_core`: token expiry checks,
//! profile normalization and login error messages.

use tcw_core::auth::{jwt, status_message};
use tcw_core::profile;
use wasm_bindgen::prelude::*;

/// Returns the version of the tcw-wasm package.
#[wasm_bindgen]
pub fn version() -> String {
    tcw_core::version().to_string()
}

/// `true` when the token is undecodable, has no `exp`, or `exp` has passed.
#[wasm_bindgen(js_name = isTokenExpired)]
pub fn is_token_expired(token: &str) -> bool {
    jwt::is_expired(token)
}

/// Expiry as milliseconds since the epoch, for `new Date(ms)`.
#[wasm_bindgen(js_name = tokenExpiryMillis)]
pub fn token_expiry_millis(token: &str) -> Option<f64> {
    jwt::expires_at(token).map(|t| t.timestamp_millis() as f64)
}

/// Normalize a profile response body (plain or enveloped JSON) into the
/// user record JSON.
#[wasm_bindgen(js_name = transformProfile)]
pub fn transform_profile(profile_json: &str) -> Result<String, JsError> {
    let body: serde_json::Value = serde_json::from_str(profile_json)?;
    let raw = profile::parse_profile(body)?;
    Ok(serde_json::to_string(&profile::transform(raw))?)
}

/// Message to show for a failed login with HTTP `status`.
#[wasm_bindgen(js_name = authErrorMessage)]
pub fn auth_error_message(status: u16) -> String {
    status_message(status)
        .unwrap_or("An unexpected error occurred during authentication.")
        .to_string()
}
