//! Access token decoding and expiry checks.
//!
//! Tokens are inspected client-side only: the payload segment is decoded
//! without verifying the signature, which is the issuer's job.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::AuthError;
use crate::models::auth::TokenClaims;

/// URL-safe alphabet, padding optional.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode the claims segment of a `header.payload.signature` token.
pub fn decode(token: &str) -> Result<TokenClaims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::MalformedToken(format!(
            "expected 3 segments, got {}",
            parts.len()
        )));
    }

    let payload = parts[1];
    if payload.is_empty() {
        return Err(AuthError::MalformedToken("empty payload segment".into()));
    }

    let bytes = PAYLOAD_ENGINE
        .decode(payload)
        .map_err(|e| AuthError::MalformedToken(format!("payload base64: {e}")))?;

    serde_json::from_slice::<TokenClaims>(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("payload json: {e}")))
}

/// Whether the token is expired at `now`. Fails closed.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    match decode(token) {
        Ok(TokenClaims { exp: Some(exp), .. }) => exp <= now.timestamp(),
        Ok(_) => {
            debug!("token has no exp claim, treating as expired");
            true
        }
        Err(e) => {
            debug!(error = %e, "token undecodable, treating as expired");
            true
        }
    }
}

/// Whether the token is expired now. Undecodable tokens and tokens without an
/// `exp` claim count as expired.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}

/// Expiry instant from the `exp` claim, if decodable.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let exp = decode(token).ok()?.exp?;
    DateTime::<Utc>::from_timestamp(exp, 0)
}
