//! System-settings singleton access. The row is created lazily with safe
//! defaults (origin check disabled) the first time anything reads it.

use chrono::Utc;
use sqlx::PgPool;

use crate::models::settings::SystemSettings;

pub async fn get_or_create_settings(pool: &PgPool) -> Result<SystemSettings, sqlx::Error> {
    sqlx::query(
        "INSERT INTO system_settings (id, allowed_ip_prefix, ip_check_enabled, updated_at) \
         VALUES (1, '', FALSE, $1) ON CONFLICT (id) DO NOTHING",
    )
    .bind(Utc::now())
    .execute(pool)
    .await?;

    sqlx::query_as::<_, SystemSettings>(
        "SELECT allowed_ip_prefix, ip_check_enabled FROM system_settings WHERE id = 1",
    )
    .fetch_one(pool)
    .await
}

pub async fn update_settings(
    pool: &PgPool,
    allowed_ip_prefix: &str,
    ip_check_enabled: bool,
) -> Result<SystemSettings, sqlx::Error> {
    sqlx::query_as::<_, SystemSettings>(
        r#"
        INSERT INTO system_settings (id, allowed_ip_prefix, ip_check_enabled, updated_at)
        VALUES (1, $1, $2, $3)
        ON CONFLICT (id) DO UPDATE
        SET allowed_ip_prefix = EXCLUDED.allowed_ip_prefix,
            ip_check_enabled = EXCLUDED.ip_check_enabled,
            updated_at = EXCLUDED.updated_at
        RETURNING allowed_ip_prefix, ip_check_enabled
        "#,
    )
    .bind(allowed_ip_prefix)
    .bind(ip_check_enabled)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}
