//! Network-origin checks for scan submissions.

use axum::http::HeaderMap;
use std::net::SocketAddr;

use crate::models::settings::SystemSettings;

/// Normalizes a raw caller address for prefix matching. The IPv6 loopback
/// maps to `127.0.0.1`, and IPv4-mapped IPv6 addresses are unwrapped to
/// the embedded IPv4 form. Returns `None` for blank input.
pub fn normalize_address(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == "::1" {
        return Some("127.0.0.1".to_string());
    }
    let unwrapped = trimmed.strip_prefix("::ffff:").unwrap_or(trimmed);
    Some(unwrapped.to_string())
}

/// Decides whether a scan from `raw` may proceed. With the check disabled
/// every caller is allowed; with it enabled an undeterminable address
/// fails closed. The match is a plain string prefix, not CIDR-aware
/// (`"10.1"` matches `10.10.x.x`).
pub fn is_origin_allowed(raw: Option<&str>, settings: &SystemSettings) -> bool {
    if !settings.ip_check_enabled {
        return true;
    }
    let Some(raw) = raw else {
        return false;
    };
    match normalize_address(raw) {
        Some(addr) => addr.starts_with(&settings.allowed_ip_prefix),
        None => false,
    }
}

/// Extracts the caller's network address: the first `X-Forwarded-For`
/// entry when present, otherwise the socket peer address.
pub fn client_address(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(prefix: &str, enabled: bool) -> SystemSettings {
        SystemSettings {
            allowed_ip_prefix: prefix.to_string(),
            ip_check_enabled: enabled,
        }
    }

    #[test]
    fn disabled_check_allows_anything() {
        let s = settings("10.0.", false);
        assert!(is_origin_allowed(Some("192.168.1.1"), &s));
        assert!(is_origin_allowed(Some("not an address"), &s));
        assert!(is_origin_allowed(None, &s));
    }

    #[test]
    fn enabled_check_fails_closed_on_missing_address() {
        let s = settings("10.0.", true);
        assert!(!is_origin_allowed(None, &s));
        assert!(!is_origin_allowed(Some("   "), &s));
    }

    #[test]
    fn prefix_match_scenarios() {
        let s = settings("10.0.", true);
        assert!(is_origin_allowed(Some("10.0.5.2"), &s));
        assert!(!is_origin_allowed(Some("192.168.1.1"), &s));
        assert!(is_origin_allowed(Some("::ffff:10.0.5.2"), &s));
    }

    #[test]
    fn loopback_normalization() {
        assert_eq!(normalize_address("::1").as_deref(), Some("127.0.0.1"));
        let s = settings("127.0.", true);
        assert!(is_origin_allowed(Some("::1"), &s));
    }

    #[test]
    fn prefix_match_is_not_cidr_aware() {
        // "10.1" matching 10.10.x.x is the documented coarseness.
        let s = settings("10.1", true);
        assert!(is_origin_allowed(Some("10.10.3.4"), &s));
        assert!(is_origin_allowed(Some("10.1.0.1"), &s));
    }

    #[test]
    fn client_address_prefers_forwarded_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "10.0.5.2, 172.16.0.1".parse().unwrap());
        let peer: SocketAddr = "192.168.1.1:4444".parse().unwrap();
        assert_eq!(
            client_address(&headers, Some(peer)).as_deref(),
            Some("10.0.5.2")
        );
    }

    #[test]
    fn client_address_falls_back_to_peer() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.168.1.1:4444".parse().unwrap();
        assert_eq!(
            client_address(&headers, Some(peer)).as_deref(),
            Some("192.168.1.1")
        );
        assert!(client_address(&headers, None).is_none());
    }
}
