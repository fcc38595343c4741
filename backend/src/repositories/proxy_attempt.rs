use sqlx::PgPool;

use crate::models::proxy_attempt::{ProxyAttempt, ProxyAttemptListItem};

/// Proxy attempts are append-only; there is no update or delete path.
pub async fn create_proxy_attempt(
    pool: &PgPool,
    attempt: &ProxyAttempt,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO proxy_attempts \
         (id, student_id, device_id, owner_student_id, session_id, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(attempt.id)
    .bind(attempt.student_id)
    .bind(&attempt.device_id)
    .bind(attempt.owner_student_id)
    .bind(attempt.session_id)
    .bind(attempt.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn list_proxy_attempts(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ProxyAttemptListItem>, sqlx::Error> {
    sqlx::query_as::<_, ProxyAttemptListItem>(
        r#"
        SELECT p.id, actor.roll_no, owner.roll_no AS owner_roll_no,
               p.device_id, p.session_id, p.created_at
        FROM proxy_attempts p
        JOIN students actor ON actor.id = p.student_id
        LEFT JOIN students owner ON owner.id = p.owner_student_id
        ORDER BY p.created_at DESC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_proxy_attempts(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM proxy_attempts")
        .fetch_one(pool)
        .await
}
