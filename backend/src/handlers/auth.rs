use axum::{
    extract::{Extension, State},
    http::header::SET_COOKIE,
    response::AppendHeaders,
    Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppError,
    models::user::{LoginRequest, LoginResponse, User, UserResponse},
    repositories::user as user_repo,
    state::AppState,
    utils::{
        cookies::{
            build_clear_cookie, build_cookie, CookieOptions, ACCESS_COOKIE_NAME,
            ACCESS_COOKIE_PATH,
        },
        jwt::create_access_token,
        password::verify_password,
    },
};

fn cookie_options(state: &AppState) -> CookieOptions {
    CookieOptions {
        secure: state.config.cookie_secure,
        same_site: state.config.cookie_same_site,
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(AppendHeaders<[(axum::http::HeaderName, String); 1]>, Json<LoginResponse>), AppError> {
    let user = user_repo::find_user_by_username(&state.pool, &payload.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    let valid = verify_password(&payload.password, &user.password_hash)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let access_token = create_access_token(
        user.id.to_string(),
        user.username.clone(),
        user.role.as_str().to_string(),
        &state.config.jwt_secret,
        state.config.jwt_expiration_hours,
    )?;

    let cookie = build_cookie(
        ACCESS_COOKIE_NAME,
        &access_token,
        std::time::Duration::from_secs(state.config.jwt_expiration_hours * 3600),
        ACCESS_COOKIE_PATH,
        cookie_options(&state),
    );

    tracing::info!(user_id = %user.id, "user logged in");

    let response = LoginResponse {
        access_token,
        user: UserResponse::from(user),
    };

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(response)))
}

pub async fn logout(
    State(state): State<AppState>,
) -> (AppendHeaders<[(axum::http::HeaderName, String); 1]>, Json<Value>) {
    let cookie = build_clear_cookie(ACCESS_COOKIE_NAME, ACCESS_COOKIE_PATH, cookie_options(&state));
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "message": "Logged out" })),
    )
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}
