mod support;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use scanmark_backend::middleware::auth;
use tower::ServiceExt;

async fn protected() -> &'static str {
    "ok"
}

fn app() -> Router {
    let state = support::test_state();
    Router::new()
        .route("/protected", get(protected))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::auth,
        ))
        .with_state(state)
}

#[tokio::test]
async fn missing_credentials_are_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn garbage_bearer_token_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, "Bearer not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_scheme_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwdw==")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cookie_with_garbage_token_is_unauthorized() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/protected")
                .header(header::COOKIE, "access_token=not-a-jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
