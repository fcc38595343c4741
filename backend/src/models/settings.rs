//! System settings singleton: the network-origin allow-list.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// At most one row exists; created lazily with safe defaults (check
/// disabled) on first read.
pub struct SystemSettings {
    /// Plain string prefix the normalized caller address must start with.
    /// Deliberately not CIDR-aware: `"10.1"` matches `10.10.x.x`.
    pub allowed_ip_prefix: String,
    pub ip_check_enabled: bool,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            allowed_ip_prefix: String::new(),
            ip_check_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSettingsRequest {
    #[validate(length(max = 64))]
    pub allowed_ip_prefix: String,
    pub ip_check_enabled: bool,
}
