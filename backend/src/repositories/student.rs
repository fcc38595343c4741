//! Student persistence, including the device-binding writes that back the
//! verification engine and the binding ledger.

use chrono::Utc;
use sqlx::{PgExecutor, PgPool};

use crate::models::student::{Student, StudentSummary};
use crate::types::{StudentId, UserId};

const SELECT_COLUMNS: &str =
    "id, user_id, roll_no, bound_device_id, device_reset_requested, created_at, updated_at";

pub async fn create_student(pool: &PgPool, student: &Student) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO students \
         (id, user_id, roll_no, bound_device_id, device_reset_requested, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(student.id)
    .bind(student.user_id)
    .bind(&student.roll_no)
    .bind(&student.bound_device_id)
    .bind(student.device_reset_requested)
    .bind(student.created_at)
    .bind(student.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_student_by_id(
    pool: &PgPool,
    id: StudentId,
) -> Result<Option<Student>, sqlx::Error> {
    let query = format!("SELECT {} FROM students WHERE id = $1", SELECT_COLUMNS);
    sqlx::query_as::<_, Student>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_student_by_user_id(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Option<Student>, sqlx::Error> {
    let query = format!("SELECT {} FROM students WHERE user_id = $1", SELECT_COLUMNS);
    sqlx::query_as::<_, Student>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Looks up the student a device identity is currently bound to, if any.
pub async fn find_student_by_device(
    pool: &PgPool,
    device_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM students WHERE bound_device_id = $1",
        SELECT_COLUMNS
    );
    sqlx::query_as::<_, Student>(&query)
        .bind(device_id)
        .fetch_optional(pool)
        .await
}

/// Conditional first-use bind. Affects zero rows when another scan has
/// already bound a device for this student, which callers must treat as
/// losing the race.
pub async fn bind_device_if_unbound<'e>(
    executor: impl PgExecutor<'e>,
    id: StudentId,
    device_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET bound_device_id = $1, updated_at = $2 \
         WHERE id = $3 AND bound_device_id IS NULL",
    )
    .bind(device_id)
    .bind(Utc::now())
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

/// Student-initiated reset request; the binding itself stays in force.
pub async fn request_device_reset(pool: &PgPool, id: StudentId) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET device_reset_requested = TRUE, updated_at = $1 WHERE id = $2",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Administrator approval: clears the binding and the request flag in one
/// statement.
pub async fn clear_device_binding(pool: &PgPool, id: StudentId) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET bound_device_id = NULL, device_reset_requested = FALSE, \
         updated_at = $1 WHERE id = $2",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Administrator rejection: clears only the request flag.
pub async fn reject_device_reset(pool: &PgPool, id: StudentId) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE students SET device_reset_requested = FALSE, updated_at = $1 WHERE id = $2",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list_students(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<StudentSummary>, sqlx::Error> {
    sqlx::query_as::<_, StudentSummary>(
        r#"
        SELECT s.id, s.roll_no, u.full_name, s.bound_device_id, s.device_reset_requested
        FROM students s
        JOIN users u ON u.id = s.user_id
        ORDER BY s.roll_no
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_students(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await
}
