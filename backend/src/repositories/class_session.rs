//! Class-session lifecycle: opening, ending, and the staleness sweep.

use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};

use crate::models::class_session::ClassSession;
use crate::types::{SessionId, SubjectId};

const SELECT_COLUMNS: &str = "id, subject_id, started_at, ended_at, is_active";

pub async fn create_session<'e>(
    executor: impl PgExecutor<'e>,
    session: &ClassSession,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO class_sessions (id, subject_id, started_at, ended_at, is_active) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(session.id)
    .bind(session.subject_id)
    .bind(session.started_at)
    .bind(session.ended_at)
    .bind(session.is_active)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_session_by_id(
    pool: &PgPool,
    id: SessionId,
) -> Result<Option<ClassSession>, sqlx::Error> {
    let query = format!("SELECT {} FROM class_sessions WHERE id = $1", SELECT_COLUMNS);
    sqlx::query_as::<_, ClassSession>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Ends one session. Affects zero rows when the session was already
/// inactive, which callers surface as a conflict.
pub async fn end_session(
    pool: &PgPool,
    id: SessionId,
    ended_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE class_sessions SET is_active = FALSE, ended_at = $1 \
         WHERE id = $2 AND is_active = TRUE",
    )
    .bind(ended_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Ends whatever session is currently live for a subject. Keeps the
/// single-live-session-per-subject assumption true when a new one opens.
pub async fn end_active_sessions_for_subject<'e>(
    executor: impl PgExecutor<'e>,
    subject_id: SubjectId,
    ended_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE class_sessions SET is_active = FALSE, ended_at = $1 \
         WHERE subject_id = $2 AND is_active = TRUE",
    )
    .bind(ended_at)
    .bind(subject_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Bulk-deactivates sessions started before `cutoff`. Idempotent; safe to
/// run concurrently with live verifications.
pub async fn sweep_stale_sessions(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
    ended_at: DateTime<Utc>,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE class_sessions SET is_active = FALSE, ended_at = $1 \
         WHERE is_active = TRUE AND started_at < $2",
    )
    .bind(ended_at)
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}
