//! The scan endpoint and the student's own attendance listing.

use axum::{
    extract::{ConnectInfo, Extension, State},
    http::HeaderMap,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppError,
    middleware::device_identity::DeviceIdentity,
    models::attendance::{ScanRequest, ScanResponse},
    models::user::User,
    repositories::{attendance as attendance_repo, student as student_repo},
    services::verification::{SqlxVerificationStore, Verdict, VerificationEngine},
    state::AppState,
    types::SessionId,
    utils::{net, time},
};

pub async fn scan(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(device): Extension<DeviceIdentity>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(payload): Json<ScanRequest>,
) -> Result<Json<ScanResponse>, AppError> {
    payload.validate()?;

    let student = student_repo::find_student_by_user_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student profile not found".to_string()))?;

    let origin = net::client_address(&headers, Some(peer));

    let engine = VerificationEngine::new(
        SqlxVerificationStore::new(state.pool.clone()),
        state.config.attendance_token_secret.clone(),
        state.config.attendance_token_ttl_seconds,
    );
    let verdict = engine
        .verify(
            &payload.token,
            &device.0,
            origin.as_deref(),
            student.id,
        )
        .await?;

    let response = match verdict {
        Verdict::Accepted { newly_bound } => {
            tracing::info!(student_id = %student.id, newly_bound, "attendance accepted");
            ScanResponse {
                status: "accepted".to_string(),
                reason: None,
                newly_bound: Some(newly_bound),
            }
        }
        Verdict::Rejected(reason) => {
            tracing::debug!(student_id = %student.id, reason = reason.as_str(), "scan rejected");
            ScanResponse {
                status: "rejected".to_string(),
                reason: Some(reason.as_str().to_string()),
                newly_bound: None,
            }
        }
        Verdict::Flagged => ScanResponse {
            status: "flagged".to_string(),
            reason: None,
            newly_bound: None,
        },
    };

    Ok(Json(response))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MyAttendanceResponse {
    pub session_id: SessionId,
    pub subject_code: String,
    pub subject_name: String,
    pub marked_at: DateTime<Utc>,
    /// Calendar date of the mark in the configured timezone.
    pub date: NaiveDate,
}

pub async fn my_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<MyAttendanceResponse>>, AppError> {
    let student = student_repo::find_student_by_user_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student profile not found".to_string()))?;

    let tz = &state.config.time_zone;
    let items = attendance_repo::list_for_student(&state.pool, student.id)
        .await?
        .into_iter()
        .map(|item| MyAttendanceResponse {
            session_id: item.session_id,
            subject_code: item.subject_code,
            subject_name: item.subject_name,
            marked_at: item.marked_at,
            date: time::local_date(item.marked_at, tz),
        })
        .collect();

    Ok(Json(items))
}
