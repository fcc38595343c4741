//! Attendance marks and the scan request/response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::{AttendanceId, SessionId, StudentId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// One persisted attendance mark. Unique per (session, student);
/// duplicate accepted scans are idempotent no-ops.
pub struct AttendanceRecord {
    pub id: AttendanceId,
    pub session_id: SessionId,
    pub student_id: StudentId,
    /// Device identity the mark was made from.
    pub device_id: String,
    pub marked_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn new(session_id: SessionId, student_id: StudentId, device_id: String) -> Self {
        Self {
            id: AttendanceId::new(),
            session_id,
            student_id,
            device_id,
            marked_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
/// Body of a scan submission.
pub struct ScanRequest {
    #[validate(length(min = 1))]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Outcome of a scan, returned with HTTP 200 regardless of verdict; the
/// `status` field carries the decision.
pub struct ScanResponse {
    /// `accepted`, `rejected`, or `flagged`.
    pub status: String,
    /// Machine-readable reason code, present when `status` is `rejected`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Present on acceptance: whether this scan bound the device.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newly_bound: Option<bool>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
/// A student's own attendance listing row.
pub struct MyAttendanceItem {
    pub session_id: SessionId,
    pub subject_code: String,
    pub subject_name: String,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow, ToSchema)]
/// Faculty per-session listing row.
pub struct SessionAttendanceItem {
    pub student_id: StudentId,
    pub roll_no: String,
    pub full_name: String,
    pub marked_at: DateTime<Utc>,
}
