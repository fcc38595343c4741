//! OpenAPI document served at /docs via Swagger UI.

use crate::{
    handlers::attendance::MyAttendanceResponse,
    models::{
        attendance::{AttendanceRecord, ScanRequest, ScanResponse, SessionAttendanceItem},
        class_session::{ClassSession, CreateSessionRequest, SessionTokenResponse, SweepResponse},
        proxy_attempt::ProxyAttemptListItem,
        settings::{SystemSettings, UpdateSettingsRequest},
        student::StudentSummary,
        subject::{CreateSubject, Subject},
        user::{CreateUser, LoginRequest, LoginResponse, UserResponse},
        PaginationQuery,
    },
};
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "scanmark",
        description = "QR attendance backend with device-bound anti-proxy verification"
    ),
    components(schemas(
        AttendanceRecord,
        ClassSession,
        CreateSessionRequest,
        CreateSubject,
        CreateUser,
        LoginRequest,
        LoginResponse,
        MyAttendanceResponse,
        PaginationQuery,
        ProxyAttemptListItem,
        ScanRequest,
        ScanResponse,
        SessionAttendanceItem,
        SessionTokenResponse,
        StudentSummary,
        Subject,
        SweepResponse,
        SystemSettings,
        UpdateSettingsRequest,
        UserResponse,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
