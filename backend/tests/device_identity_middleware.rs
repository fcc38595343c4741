mod support;

use axum::{
    body::Body,
    extract::Extension,
    http::{header, Request, StatusCode},
    middleware as axum_middleware,
    routing::get,
    Router,
};
use scanmark_backend::middleware::device_identity::{device_identity, DeviceIdentity};
use tower::ServiceExt;

async fn echo_device(Extension(device): Extension<DeviceIdentity>) -> String {
    device.0
}

fn app() -> Router {
    let state = support::test_state();
    Router::new()
        .route("/probe", get(echo_device))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            device_identity,
        ))
        .with_state(state)
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf8")
}

#[tokio::test]
async fn first_touch_mints_a_long_lived_strict_cookie() {
    let response = app()
        .oneshot(Request::builder().uri("/probe").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("device cookie should be set")
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("device_id="));
    assert!(set_cookie.contains("Max-Age=315360000"));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/"));

    // The handler sees the same value the cookie carries.
    let cookie_value = set_cookie
        .split(';')
        .next()
        .unwrap()
        .trim_start_matches("device_id=")
        .to_string();
    let body = body_string(response).await;
    assert_eq!(body, cookie_value);
}

#[tokio::test]
async fn existing_cookie_passes_through_unchanged() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/probe")
                .header(header::COOKIE, "device_id=existing-device-id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // No re-issue once an identity exists.
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_string(response).await, "existing-device-id");
}

#[tokio::test]
async fn two_first_touches_get_distinct_identities() {
    let first = app()
        .oneshot(Request::builder().uri("/probe").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let second = app()
        .oneshot(Request::builder().uri("/probe").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_ne!(body_string(first).await, body_string(second).await);
}
