//! Subjects and their owning faculty.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{SubjectId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Subject {
    pub id: SubjectId,
    pub code: String,
    pub name: String,
    /// Faculty account that owns this subject and its sessions.
    pub faculty_user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Subject {
    pub fn new(code: String, name: String, faculty_user_id: UserId) -> Self {
        Self {
            id: SubjectId::new(),
            code,
            name,
            faculty_user_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSubject {
    #[validate(length(min = 1, max = 32))]
    pub code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub faculty_user_id: UserId,
}
