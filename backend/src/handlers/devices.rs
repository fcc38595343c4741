//! Device-binding ledger endpoints.
//!
//! A student can only flag that they need a reset; the binding stays in
//! force until an administrator approves, so the anti-proxy control cannot
//! be self-serviced away.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::user::User,
    repositories::student as student_repo,
    state::AppState,
    types::StudentId,
};

/// Student-only: asks an administrator to clear the caller's own binding.
pub async fn request_reset(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let student = student_repo::find_student_by_user_id(&state.pool, user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Student profile not found".to_string()))?;

    student_repo::request_device_reset(&state.pool, student.id).await?;

    tracing::info!(student_id = %student.id, "device reset requested");

    Ok(Json(json!({ "message": "Device reset requested" })))
}

/// Admin-only: approves a reset, clearing the binding and the request flag
/// in one statement. The student's next accepted scan re-binds.
pub async fn reset_binding(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<Value>, AppError> {
    let cleared = student_repo::clear_device_binding(&state.pool, student_id).await?;
    if cleared == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    tracing::info!(%student_id, "device binding cleared by administrator");

    Ok(Json(json!({ "message": "Device binding cleared" })))
}

/// Admin-only: rejects a reset request; the binding is untouched.
pub async fn reject_reset(
    State(state): State<AppState>,
    Path(student_id): Path<StudentId>,
) -> Result<Json<Value>, AppError> {
    let updated = student_repo::reject_device_reset(&state.pool, student_id).await?;
    if updated == 0 {
        return Err(AppError::NotFound("Student not found".to_string()));
    }

    Ok(Json(json!({ "message": "Device reset request rejected" })))
}
