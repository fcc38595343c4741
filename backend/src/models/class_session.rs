//! Live class sessions: one attendance-taking window for a subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::types::{SessionId, SubjectId};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
/// Database representation of a class session.
pub struct ClassSession {
    pub id: SessionId,
    pub subject_id: SubjectId,
    pub started_at: DateTime<Utc>,
    /// `None` while the session is live.
    pub ended_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ClassSession {
    pub fn new(subject_id: SubjectId) -> Self {
        Self {
            id: SessionId::new(),
            subject_id,
            started_at: Utc::now(),
            ended_at: None,
            is_active: true,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSessionRequest {
    pub subject_id: SubjectId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Rotating attendance token handed to the presenter display.
pub struct SessionTokenResponse {
    pub token: String,
    /// Seconds until the token stops verifying; the display should re-poll
    /// before this elapses.
    pub expires_in_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
/// Result of the staleness sweep.
pub struct SweepResponse {
    /// Number of sessions transitioned to inactive.
    pub deactivated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_active_and_open_ended() {
        let session = ClassSession::new(SubjectId::new());
        assert!(session.is_active);
        assert!(session.ended_at.is_none());
    }
}
