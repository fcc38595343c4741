//! Session lifecycle endpoints: open, end, attendance listing, the
//! rotating-token issuer, and the staleness sweep.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::attendance::SessionAttendanceItem,
    models::class_session::{
        ClassSession, CreateSessionRequest, SessionTokenResponse, SweepResponse,
    },
    models::subject::Subject,
    models::user::User,
    repositories::{
        attendance as attendance_repo, class_session as session_repo, subject as subject_repo,
        transaction,
    },
    state::AppState,
    types::SessionId,
    utils::qr_token,
};

/// Loads the session's subject and enforces the session-scoped capability:
/// the owning faculty or an administrator.
async fn authorize_session_owner(
    state: &AppState,
    session: &ClassSession,
    user: &User,
) -> Result<Subject, AppError> {
    let subject = subject_repo::find_subject_by_id(&state.pool, session.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;
    if !user.is_admin() && subject.faculty_user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the owning faculty may manage this session".to_string(),
        ));
    }
    Ok(subject)
}

pub async fn create_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<ClassSession>, AppError> {
    let subject = subject_repo::find_subject_by_id(&state.pool, payload.subject_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;
    if !user.is_admin() && subject.faculty_user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the owning faculty may start a session".to_string(),
        ));
    }

    let session = ClassSession::new(subject.id);

    // One live session per subject: anything still open is auto-ended
    // before the new one becomes visible.
    let mut tx = transaction::begin_transaction(&state.pool).await?;
    let ended =
        session_repo::end_active_sessions_for_subject(&mut *tx, subject.id, session.started_at)
            .await
            .map_err(AppError::from)?;
    session_repo::create_session(&mut *tx, &session)
        .await
        .map_err(AppError::from)?;
    transaction::commit_transaction(tx).await?;

    tracing::info!(
        session_id = %session.id,
        subject = %subject.code,
        auto_ended = ended,
        "session opened"
    );

    Ok(Json(session))
}

pub async fn end_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<Value>, AppError> {
    let session = session_repo::find_session_by_id(&state.pool, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    authorize_session_owner(&state, &session, &user).await?;

    let ended = session_repo::end_session(&state.pool, session_id, Utc::now()).await?;
    if ended == 0 {
        return Err(AppError::BadRequest("Session already ended".to_string()));
    }

    tracing::info!(session_id = %session_id, "session ended");

    Ok(Json(json!({ "message": "Session ended", "session_id": session_id })))
}

pub async fn issue_token(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionTokenResponse>, AppError> {
    let session = session_repo::find_session_by_id(&state.pool, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    authorize_session_owner(&state, &session, &user).await?;

    if !session.is_active {
        return Err(AppError::BadRequest("Session has ended".to_string()));
    }

    let token = qr_token::issue_attendance_token(session.id, &state.config.attendance_token_secret)?;

    Ok(Json(SessionTokenResponse {
        token,
        expires_in_seconds: state.config.attendance_token_ttl_seconds,
    }))
}

pub async fn session_attendance(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<Vec<SessionAttendanceItem>>, AppError> {
    let session = session_repo::find_session_by_id(&state.pool, session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;
    authorize_session_owner(&state, &session, &user).await?;

    let items = attendance_repo::list_for_session(&state.pool, session_id).await?;
    Ok(Json(items))
}

/// Unauthenticated by design: invoked by a trusted scheduler. Only
/// transitions sessions whose start time is already past the threshold,
/// so concurrent live verifications are unaffected.
pub async fn sweep_stale_sessions(
    State(state): State<AppState>,
) -> Result<Json<SweepResponse>, AppError> {
    let now = Utc::now();
    let cutoff = now - Duration::hours(state.config.session_stale_hours);
    let deactivated = session_repo::sweep_stale_sessions(&state.pool, cutoff, now).await?;

    if deactivated > 0 {
        tracing::info!(deactivated, "stale sessions swept");
    }

    Ok(Json(SweepResponse { deactivated }))
}
