//! Administrator surfaces: the minimum record-keeping the integrity core
//! needs (users, subjects), plus the security dashboard data (proxy
//! attempts, device-reset approvals) and the network settings singleton.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::settings::{SystemSettings, UpdateSettingsRequest},
    models::student::{Student, StudentSummary},
    models::subject::{CreateSubject, Subject},
    models::user::{CreateUser, User, UserResponse, UserRole},
    models::proxy_attempt::ProxyAttemptListItem,
    models::{PaginatedResponse, PaginationQuery},
    repositories::{
        proxy_attempt as proxy_attempt_repo, settings as settings_repo, student as student_repo,
        subject as subject_repo, user as user_repo,
    },
    state::AppState,
    utils::password::hash_password,
};

pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUser>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    payload.validate()?;

    let roll_no = match payload.role {
        UserRole::Student => Some(
            payload
                .roll_no
                .clone()
                .ok_or_else(|| AppError::BadRequest("roll_no is required for students".into()))?,
        ),
        _ => None,
    };

    let password_hash = hash_password(&payload.password)?;
    let user = User::new(
        payload.username.clone(),
        password_hash,
        payload.full_name.clone(),
        payload.role,
    );

    user_repo::create_user(&state.pool, &user).await?;
    if let Some(roll_no) = roll_no {
        let student = Student::new(user.id, roll_no);
        student_repo::create_student(&state.pool, &student).await?;
    }

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user created");

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

pub async fn create_subject(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubject>,
) -> Result<(StatusCode, Json<Subject>), AppError> {
    payload.validate()?;

    let faculty = user_repo::find_user_by_id(&state.pool, payload.faculty_user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Faculty user not found".to_string()))?;
    if !faculty.is_faculty() {
        return Err(AppError::BadRequest(
            "Subject owner must hold the faculty role".to_string(),
        ));
    }

    let subject = Subject::new(payload.code, payload.name, faculty.id);
    subject_repo::create_subject(&state.pool, &subject).await?;

    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn list_students(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<StudentSummary>>, AppError> {
    let limit = pagination.limit();
    let offset = pagination.offset();
    let students = student_repo::list_students(&state.pool, limit, offset).await?;
    let total = student_repo::count_students(&state.pool).await?;
    Ok(Json(PaginatedResponse::new(students, total, limit, offset)))
}

pub async fn list_proxy_attempts(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<PaginatedResponse<ProxyAttemptListItem>>, AppError> {
    let limit = pagination.limit();
    let offset = pagination.offset();
    let attempts = proxy_attempt_repo::list_proxy_attempts(&state.pool, limit, offset).await?;
    let total = proxy_attempt_repo::count_proxy_attempts(&state.pool).await?;
    Ok(Json(PaginatedResponse::new(attempts, total, limit, offset)))
}

pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SystemSettings>, AppError> {
    let settings = settings_repo::get_or_create_settings(&state.pool).await?;
    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<SystemSettings>, AppError> {
    payload.validate()?;

    let settings = settings_repo::update_settings(
        &state.pool,
        &payload.allowed_ip_prefix,
        payload.ip_check_enabled,
    )
    .await?;

    tracing::info!(
        prefix = %settings.allowed_ip_prefix,
        enabled = settings.ip_check_enabled,
        "origin settings updated"
    );

    Ok(Json(settings))
}
