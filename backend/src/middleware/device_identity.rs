//! Device identity provider.
//!
//! Every inbound request gets a stable per-browser device identifier. The
//! first touch mints a 128-bit random id and sets it as a long-lived,
//! HttpOnly, SameSite=Strict cookie; afterwards the cookie value is passed
//! through unchanged. Handlers read it from the [`DeviceIdentity`]
//! request extension.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use rand::Rng;

use crate::{
    state::AppState,
    utils::cookies::{
        build_cookie, extract_cookie_value, CookieOptions, SameSite, DEVICE_COOKIE_MAX_AGE,
        DEVICE_COOKIE_NAME, DEVICE_COOKIE_PATH,
    },
};

#[derive(Clone, Debug)]
pub struct DeviceIdentity(pub String);

pub async fn device_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = request
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| extract_cookie_value(raw, DEVICE_COOKIE_NAME));

    let (device_id, minted) = match existing {
        Some(value) => (value, false),
        None => (mint_device_id(), true),
    };

    request
        .extensions_mut()
        .insert(DeviceIdentity(device_id.clone()));

    let mut response = next.run(request).await;

    if minted {
        // The device cookie is always Strict regardless of the auth
        // cookie's configured SameSite.
        let cookie = build_cookie(
            DEVICE_COOKIE_NAME,
            &device_id,
            DEVICE_COOKIE_MAX_AGE,
            DEVICE_COOKIE_PATH,
            CookieOptions {
                secure: state.config.cookie_secure,
                same_site: SameSite::Strict,
            },
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// 128 bits of randomness, hex-encoded. Collisions are negligible at any
/// realistic fleet size.
fn mint_device_id() -> String {
    let bits: u128 = rand::thread_rng().gen();
    format!("{:032x}", bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_ids_are_32_hex_chars() {
        let id = mint_device_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn minted_ids_are_unique() {
        let a = mint_device_id();
        let b = mint_device_id();
        assert_ne!(a, b);
    }
}
