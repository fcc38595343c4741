use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use scanmark_backend::{
    config::Config,
    db::connection::{create_pool, DbPool},
    docs::ApiDoc,
    handlers,
    middleware::{auth, device_identity, rate_limit},
    state::AppState,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60));

    if config.cors_allow_origins.iter().any(|o| o == "*") {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allow_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scanmark_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        jwt_secret = %mask_secret(&config.jwt_secret),
        attendance_token_secret = %mask_secret(&config.attendance_token_secret),
        attendance_token_ttl_seconds = config.attendance_token_ttl_seconds,
        session_stale_hours = config.session_stale_hours,
        time_zone = %config.time_zone,
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool: DbPool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let state = AppState::new(pool, config.clone());
    let rate_limiter = rate_limit::create_ip_rate_limiter(&config);

    // Public routes: login (rate limited) and the trusted-scheduler sweep.
    let public_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(rate_limiter.clone())
        .route(
            "/api/internal/sessions/sweep",
            post(handlers::sessions::sweep_stale_sessions),
        );

    // Routes for any authenticated account.
    let user_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::auth,
        ));

    // Student routes: scanning and the binding-reset request. The scan
    // route carries the per-IP limiter; it is the abuse target.
    let student_routes = Router::new()
        .route("/api/attendance/scan", post(handlers::attendance::scan))
        .layer(rate_limiter.clone())
        .route("/api/attendance/me", get(handlers::attendance::my_attendance))
        .route(
            "/api/devices/reset-request",
            post(handlers::devices::request_reset),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::auth_student,
        ));

    // Faculty routes: session lifecycle and the rotating token.
    let faculty_routes = Router::new()
        .route("/api/sessions", post(handlers::sessions::create_session))
        .route("/api/sessions/{id}/end", put(handlers::sessions::end_session))
        .route(
            "/api/sessions/{id}/token",
            get(handlers::sessions::issue_token).layer(rate_limiter),
        )
        .route(
            "/api/sessions/{id}/attendance",
            get(handlers::sessions::session_attendance),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::auth_faculty,
        ));

    // Admin routes: record-keeping glue plus the security surfaces.
    let admin_routes = Router::new()
        .route("/api/admin/users", post(handlers::admin::create_user))
        .route("/api/admin/subjects", post(handlers::admin::create_subject))
        .route("/api/admin/students", get(handlers::admin::list_students))
        .route(
            "/api/admin/students/{id}/device/reset",
            put(handlers::devices::reset_binding),
        )
        .route(
            "/api/admin/students/{id}/device/reject-reset",
            put(handlers::devices::reject_reset),
        )
        .route(
            "/api/admin/proxy-attempts",
            get(handlers::admin::list_proxy_attempts),
        )
        .route(
            "/api/admin/settings",
            get(handlers::admin::get_settings).put(handlers::admin::update_settings),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::auth_admin,
        ));

    // Compose app with shared layers and state. The device-identity layer
    // wraps everything so any first-touch request mints the cookie.
    let app = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(student_routes)
        .merge(faculty_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config))
                .layer(axum_middleware::from_fn(
                    scanmark_backend::middleware::request_id::request_id,
                ))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    device_identity::device_identity,
                )),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
