use sqlx::PgPool;

use crate::models::subject::Subject;
use crate::types::SubjectId;

const SELECT_COLUMNS: &str = "id, code, name, faculty_user_id, created_at";

pub async fn create_subject(pool: &PgPool, subject: &Subject) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO subjects (id, code, name, faculty_user_id, created_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(subject.id)
    .bind(&subject.code)
    .bind(&subject.name)
    .bind(subject.faculty_user_id)
    .bind(subject.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_subject_by_id(
    pool: &PgPool,
    id: SubjectId,
) -> Result<Option<Subject>, sqlx::Error> {
    let query = format!("SELECT {} FROM subjects WHERE id = $1", SELECT_COLUMNS);
    sqlx::query_as::<_, Subject>(&query)
        .bind(id)
        .fetch_optional(pool)
        .await
}
