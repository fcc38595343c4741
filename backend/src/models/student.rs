//! Student profiles and the device-binding fields attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{StudentId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a student profile.
pub struct Student {
    pub id: StudentId,
    /// Account this profile belongs to.
    pub user_id: UserId,
    pub roll_no: String,
    /// Device identifier currently authorized to mark attendance for this
    /// student. `None` until the first successful mark binds one.
    pub bound_device_id: Option<String>,
    /// Set by the student to ask an administrator to clear the binding.
    /// The binding itself stays in force until the administrator acts.
    pub device_reset_requested: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    pub fn new(user_id: UserId, roll_no: String) -> Self {
        let now = Utc::now();
        Self {
            id: StudentId::new(),
            user_id,
            roll_no,
            bound_device_id: None,
            device_reset_requested: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` when a device has been bound to this student.
    pub fn has_bound_device(&self) -> bool {
        self.bound_device_id.is_some()
    }
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
/// Admin listing row: student joined with the owning account's name.
pub struct StudentSummary {
    pub id: StudentId,
    pub roll_no: String,
    pub full_name: String,
    pub bound_device_id: Option<String>,
    pub device_reset_requested: bool,
}
