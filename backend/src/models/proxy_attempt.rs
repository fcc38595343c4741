//! Proxy-attempt records: scans whose device identity did not match the
//! claiming student's binding. Immutable once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{ProxyAttemptId, SessionId, StudentId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProxyAttempt {
    pub id: ProxyAttemptId,
    /// Student whose attendance the scan claimed.
    pub student_id: StudentId,
    /// Device identity the scan was made from.
    pub device_id: String,
    /// Student the device is actually bound to, when one exists.
    pub owner_student_id: Option<StudentId>,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
}

impl ProxyAttempt {
    pub fn new(
        student_id: StudentId,
        device_id: String,
        owner_student_id: Option<StudentId>,
        session_id: SessionId,
    ) -> Self {
        Self {
            id: ProxyAttemptId::new(),
            student_id,
            device_id,
            owner_student_id,
            session_id,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
/// Admin listing row with roll numbers resolved for display.
pub struct ProxyAttemptListItem {
    pub id: ProxyAttemptId,
    pub roll_no: String,
    pub owner_roll_no: Option<String>,
    pub device_id: String,
    pub session_id: SessionId,
    pub created_at: DateTime<Utc>,
}
