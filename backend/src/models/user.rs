//! Models that represent user accounts, authentication payloads, and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::UserId;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of an authenticated user account.
pub struct User {
    /// Unique identifier for the user.
    pub id: UserId,
    /// Immutable username used for login.
    pub username: String,
    /// Argon2 hash of the user's password.
    pub password_hash: String,
    /// Human-readable full name.
    pub full_name: String,
    /// Role describing the user's privileges.
    pub role: UserRole,
    /// Creation timestamp for auditing.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp for auditing.
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
/// Supported user roles stored in the database.
pub enum UserRole {
    /// Enrolled student; may mark their own attendance.
    #[default]
    Student,
    /// Teaching staff; owns subjects and runs live sessions.
    Faculty,
    /// Administrator with full access.
    Admin,
}

impl UserRole {
    /// Returns the canonical snake_case representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Faculty => "faculty",
            UserRole::Admin => "admin",
        }
    }
}

impl Serialize for UserRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for UserRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "student" => Ok(UserRole::Student),
            "faculty" => Ok(UserRole::Faculty),
            "admin" => Ok(UserRole::Admin),
            // tolerate common legacy casings
            "Student" | "STUDENT" => Ok(UserRole::Student),
            "Faculty" | "FACULTY" => Ok(UserRole::Faculty),
            "Admin" | "ADMIN" => Ok(UserRole::Admin),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["student", "faculty", "admin"],
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
/// Payload for creating a new user account.
pub struct CreateUser {
    #[validate(length(min = 3, max = 64))]
    pub username: String,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    pub role: UserRole,
    /// Roll number; required when the role is `student`.
    #[validate(length(min = 1, max = 32))]
    pub roll_no: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Credentials submitted by a user attempting to authenticate.
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Authentication token returned after a successful login.
pub struct LoginResponse {
    pub access_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Public-facing representation of a user returned by the API.
pub struct UserResponse {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            role: user.role.as_str().to_string(),
        }
    }
}

impl User {
    /// Constructs a new user with freshly generated identifiers.
    pub fn new(username: String, password_hash: String, full_name: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username,
            password_hash,
            full_name,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns `true` when the user holds the `Admin` role.
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Returns `true` when the user holds the `Faculty` role.
    pub fn is_faculty(&self) -> bool {
        matches!(self.role, UserRole::Faculty)
    }

    /// Returns `true` when the user holds the `Student` role.
    pub fn is_student(&self) -> bool {
        matches!(self.role, UserRole::Student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn user_role_serde_accepts_and_emits_snake_case() {
        let s: UserRole = serde_json::from_str("\"student\"").unwrap();
        let f: UserRole = serde_json::from_str("\"faculty\"").unwrap();
        let a: UserRole = serde_json::from_str("\"admin\"").unwrap();
        assert!(matches!(s, UserRole::Student));
        assert!(matches!(f, UserRole::Faculty));
        assert!(matches!(a, UserRole::Admin));

        // Tolerate legacy casings
        let a2: UserRole = serde_json::from_str("\"ADMIN\"").unwrap();
        assert!(matches!(a2, UserRole::Admin));

        let emitted = serde_json::to_value(UserRole::Faculty).unwrap();
        assert_eq!(emitted, Value::String("faculty".into()));
    }

    #[test]
    fn user_response_role_is_snake_case_string() {
        let user = User::new(
            "asha".to_string(),
            "hash".to_string(),
            "Asha Rao".to_string(),
            UserRole::Faculty,
        );
        let resp: UserResponse = user.into();
        assert_eq!(resp.role, "faculty");
    }

    #[test]
    fn role_predicates_match_role() {
        let user = User::new("x".into(), "h".into(), "X".into(), UserRole::Student);
        assert!(user.is_student());
        assert!(!user.is_faculty());
        assert!(!user.is_admin());
    }
}
