use anyhow::anyhow;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::env;

use crate::utils::cookies::SameSite;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    /// Dedicated signing secret for rotating attendance tokens. Kept
    /// separate from `jwt_secret` so leaking a presenter display never
    /// compromises login tokens.
    pub attendance_token_secret: String,
    /// Validity window of an issued attendance token, in seconds.
    pub attendance_token_ttl_seconds: u64,
    /// Sessions older than this many hours are ended by the sweep.
    pub session_stale_hours: i64,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub cors_allow_origins: Vec<String>,
    /// Per-IP burst allowance for the scan/token/login routes.
    pub rate_limit_burst: u32,
    /// Refill window for the per-IP limiter, in seconds.
    pub rate_limit_window_seconds: u64,
    pub time_zone: Tz,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/scanmark".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .unwrap_or_else(|_| "your-secret-key-change-this-in-production".to_string());

        let jwt_expiration_hours = env::var("JWT_EXPIRATION_HOURS")
            .unwrap_or_else(|_| "12".to_string())
            .parse()
            .unwrap_or(12);

        let attendance_token_secret = env::var("ATTENDANCE_TOKEN_SECRET")
            .unwrap_or_else(|_| "attendance-token-secret-change-this".to_string());

        let attendance_token_ttl_seconds = env::var("ATTENDANCE_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let session_stale_hours = env::var("SESSION_STALE_HOURS")
            .unwrap_or_else(|_| "4".to_string())
            .parse()
            .unwrap_or(4);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let cookie_same_site = match env::var("COOKIE_SAME_SITE")
            .unwrap_or_else(|_| "strict".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "lax" => SameSite::Lax,
            "none" => SameSite::None,
            _ => SameSite::Strict,
        };

        let cors_allow_origins = env::var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let rate_limit_burst = env::var("RATE_LIMIT_BURST")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .unwrap_or(30);

        let rate_limit_window_seconds = env::var("RATE_LIMIT_WINDOW_SECONDS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);

        let time_zone_name = env::var("APP_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let time_zone: Tz = time_zone_name
            .parse()
            .map_err(|_| anyhow!("Invalid APP_TIMEZONE value: {}", time_zone_name))?;

        Ok(Config {
            database_url,
            jwt_secret,
            jwt_expiration_hours,
            attendance_token_secret,
            attendance_token_ttl_seconds,
            session_stale_hours,
            cookie_secure,
            cookie_same_site,
            cors_allow_origins,
            rate_limit_burst,
            rate_limit_window_seconds,
            time_zone,
        })
    }
}
