//! Codec for the rotating attendance tokens shown on the presenter display.
//!
//! A token is a signed bundle {session id, issue millis, type tag}. The
//! signature proves authenticity and integrity only; the validity window
//! is enforced by the verification engine against `iat_ms`, so a token
//! remains decodable (and inspectable) after it has gone stale.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Fixed type discriminator embedded in every attendance token.
pub const ATTENDANCE_TOKEN_TYPE: &str = "attendance";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceTokenClaims {
    /// Class session this token is scoped to.
    pub sid: String,
    /// Issue time in epoch milliseconds.
    pub iat_ms: i64,
    /// Type discriminator; always [`ATTENDANCE_TOKEN_TYPE`].
    pub typ: String,
}

pub fn issue_attendance_token(session_id: SessionId, secret: &str) -> anyhow::Result<String> {
    issue_attendance_token_at(session_id, Utc::now().timestamp_millis(), secret)
}

/// Issues a token with an explicit issue timestamp. Exposed so freshness
/// behavior can be exercised without a fake clock.
pub fn issue_attendance_token_at(
    session_id: SessionId,
    iat_ms: i64,
    secret: &str,
) -> anyhow::Result<String> {
    let claims = AttendanceTokenClaims {
        sid: session_id.to_string(),
        iat_ms,
        typ: ATTENDANCE_TOKEN_TYPE.to_string(),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )?;
    Ok(token)
}

pub fn verify_attendance_token(token: &str, secret: &str) -> anyhow::Result<AttendanceTokenClaims> {
    // No exp claim: expiry is checked by the caller via `is_fresh`.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    let data = decode::<AttendanceTokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )?;
    if data.claims.typ != ATTENDANCE_TOKEN_TYPE {
        anyhow::bail!("unexpected token type: {}", data.claims.typ);
    }
    Ok(data.claims)
}

/// Returns `true` while `now_ms` falls within `[iat_ms, iat_ms + ttl)`.
/// A token is stale at exactly `ttl` after issue; a token from the future
/// (clock skew, tampering) is not fresh either.
pub fn is_fresh(claims: &AttendanceTokenClaims, now_ms: i64, ttl_seconds: u64) -> bool {
    let age_ms = now_ms - claims.iat_ms;
    age_ms >= 0 && age_ms < (ttl_seconds as i64) * 1000
}
