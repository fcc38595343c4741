use sqlx::{PgExecutor, PgPool};

use crate::models::attendance::{AttendanceRecord, MyAttendanceItem, SessionAttendanceItem};
use crate::types::{SessionId, StudentId};

/// Inserts a mark; a duplicate (session, student) pair is a no-op, making
/// repeated accepted scans idempotent. Returns the number of rows written.
pub async fn insert_attendance_if_absent<'e>(
    executor: impl PgExecutor<'e>,
    record: &AttendanceRecord,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO attendance_records (id, session_id, student_id, device_id, marked_at) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (session_id, student_id) DO NOTHING",
    )
    .bind(record.id)
    .bind(record.session_id)
    .bind(record.student_id)
    .bind(&record.device_id)
    .bind(record.marked_at)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_for_student(
    pool: &PgPool,
    student_id: StudentId,
) -> Result<Vec<MyAttendanceItem>, sqlx::Error> {
    sqlx::query_as::<_, MyAttendanceItem>(
        r#"
        SELECT a.session_id, sub.code AS subject_code, sub.name AS subject_name, a.marked_at
        FROM attendance_records a
        JOIN class_sessions cs ON cs.id = a.session_id
        JOIN subjects sub ON sub.id = cs.subject_id
        WHERE a.student_id = $1
        ORDER BY a.marked_at DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub async fn list_for_session(
    pool: &PgPool,
    session_id: SessionId,
) -> Result<Vec<SessionAttendanceItem>, sqlx::Error> {
    sqlx::query_as::<_, SessionAttendanceItem>(
        r#"
        SELECT a.student_id, s.roll_no, u.full_name, a.marked_at
        FROM attendance_records a
        JOIN students s ON s.id = a.student_id
        JOIN users u ON u.id = s.user_id
        WHERE a.session_id = $1
        ORDER BY s.roll_no
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await
}
