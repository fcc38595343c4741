//! Attendance verification engine.
//!
//! Consumes a scanned token plus the caller's device identity and network
//! origin and produces a [`Verdict`]. The decision helpers are pure; every
//! durable effect goes through the [`VerificationStore`] trait, so the
//! engine is testable without a database and the sqlx-backed store is the
//! only place that touches transactions.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::AppError;
use crate::models::attendance::AttendanceRecord;
use crate::models::class_session::ClassSession;
use crate::models::proxy_attempt::ProxyAttempt;
use crate::models::settings::SystemSettings;
use crate::models::student::Student;
use crate::repositories::{
    attendance as attendance_repo, class_session as session_repo,
    proxy_attempt as proxy_attempt_repo, settings as settings_repo, student as student_repo,
    transaction,
};
use crate::types::{SessionId, StudentId};
use crate::utils::net;
use crate::utils::qr_token;

/// Machine-readable rejection reasons, in the order the checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidToken,
    ExpiredToken,
    SessionClosed,
    OriginNotAllowed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidToken => "invalid_token",
            RejectReason::ExpiredToken => "expired_token",
            RejectReason::SessionClosed => "session_closed",
            RejectReason::OriginNotAllowed => "origin_not_allowed",
        }
    }
}

/// Outcome of a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Attendance was marked. `newly_bound` reports whether this scan
    /// performed the first-use device binding.
    Accepted { newly_bound: bool },
    /// Terminal rejection with no durable side effect.
    Rejected(RejectReason),
    /// Device mismatch: a proxy-attempt record was written and no
    /// attendance was marked.
    Flagged,
}

/// How a presented device relates to a student's current binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingOutcome {
    /// No device bound yet; this scan may claim the binding.
    FirstUse,
    /// Presented device is the bound device.
    Match,
    /// Presented device differs from the bound device.
    Mismatch,
}

/// Pure comparison of a stored binding against the presented device.
pub fn evaluate_binding(bound: Option<&str>, presented: &str) -> BindingOutcome {
    match bound {
        None => BindingOutcome::FirstUse,
        Some(current) if current == presented => BindingOutcome::Match,
        Some(_) => BindingOutcome::Mismatch,
    }
}

/// Store operations the engine needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VerificationStore: Send + Sync {
    async fn find_session(&self, id: SessionId) -> Result<Option<ClassSession>, AppError>;

    async fn load_settings(&self) -> Result<SystemSettings, AppError>;

    async fn find_student(&self, id: StudentId) -> Result<Option<Student>, AppError>;

    async fn find_student_by_device(&self, device_id: &str)
        -> Result<Option<Student>, AppError>;

    /// Atomically binds `device_id` to a still-unbound student and inserts
    /// the attendance mark in the same transaction. Returns `false` when
    /// the conditional bind affected zero rows (the student is no longer
    /// unbound); nothing is written in that case.
    async fn bind_and_mark(
        &self,
        session_id: SessionId,
        student_id: StudentId,
        device_id: &str,
    ) -> Result<bool, AppError>;

    /// Inserts the attendance mark; duplicate (session, student) pairs are
    /// idempotent no-ops.
    async fn mark_attendance(
        &self,
        session_id: SessionId,
        student_id: StudentId,
        device_id: &str,
    ) -> Result<(), AppError>;

    async fn record_proxy_attempt(
        &self,
        student_id: StudentId,
        device_id: &str,
        owner_student_id: Option<StudentId>,
        session_id: SessionId,
    ) -> Result<(), AppError>;
}

/// sqlx-backed store used in production.
pub struct SqlxVerificationStore {
    pool: sqlx::PgPool,
}

impl SqlxVerificationStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationStore for SqlxVerificationStore {
    async fn find_session(&self, id: SessionId) -> Result<Option<ClassSession>, AppError> {
        Ok(session_repo::find_session_by_id(&self.pool, id).await?)
    }

    async fn load_settings(&self) -> Result<SystemSettings, AppError> {
        Ok(settings_repo::get_or_create_settings(&self.pool).await?)
    }

    async fn find_student(&self, id: StudentId) -> Result<Option<Student>, AppError> {
        Ok(student_repo::find_student_by_id(&self.pool, id).await?)
    }

    async fn find_student_by_device(
        &self,
        device_id: &str,
    ) -> Result<Option<Student>, AppError> {
        Ok(student_repo::find_student_by_device(&self.pool, device_id).await?)
    }

    async fn bind_and_mark(
        &self,
        session_id: SessionId,
        student_id: StudentId,
        device_id: &str,
    ) -> Result<bool, AppError> {
        let mut tx = transaction::begin_transaction(&self.pool).await?;
        let bound = student_repo::bind_device_if_unbound(&mut *tx, student_id, device_id)
            .await
            .map_err(AppError::from)?;
        if bound == 0 {
            transaction::rollback_transaction(tx).await?;
            return Ok(false);
        }
        let record = AttendanceRecord::new(session_id, student_id, device_id.to_string());
        attendance_repo::insert_attendance_if_absent(&mut *tx, &record)
            .await
            .map_err(AppError::from)?;
        transaction::commit_transaction(tx).await?;
        Ok(true)
    }

    async fn mark_attendance(
        &self,
        session_id: SessionId,
        student_id: StudentId,
        device_id: &str,
    ) -> Result<(), AppError> {
        let record = AttendanceRecord::new(session_id, student_id, device_id.to_string());
        attendance_repo::insert_attendance_if_absent(&self.pool, &record).await?;
        Ok(())
    }

    async fn record_proxy_attempt(
        &self,
        student_id: StudentId,
        device_id: &str,
        owner_student_id: Option<StudentId>,
        session_id: SessionId,
    ) -> Result<(), AppError> {
        let attempt = ProxyAttempt::new(
            student_id,
            device_id.to_string(),
            owner_student_id,
            session_id,
        );
        proxy_attempt_repo::create_proxy_attempt(&self.pool, &attempt).await?;
        Ok(())
    }
}

pub struct VerificationEngine<S> {
    store: S,
    token_secret: String,
    token_ttl_seconds: u64,
}

impl<S: VerificationStore> VerificationEngine<S> {
    /// The signing secret and validity window come in explicitly; the
    /// engine never reads ambient process state.
    pub fn new(store: S, token_secret: impl Into<String>, token_ttl_seconds: u64) -> Self {
        Self {
            store,
            token_secret: token_secret.into(),
            token_ttl_seconds,
        }
    }

    /// Decides a single scan. Store failures propagate as errors (the
    /// caller sees a retryable 500, never a verdict); every other path
    /// returns a [`Verdict`].
    pub async fn verify(
        &self,
        raw_token: &str,
        device_id: &str,
        origin: Option<&str>,
        student_id: StudentId,
    ) -> Result<Verdict, AppError> {
        let claims = match qr_token::verify_attendance_token(raw_token, &self.token_secret) {
            Ok(claims) => claims,
            Err(_) => return Ok(Verdict::Rejected(RejectReason::InvalidToken)),
        };

        if !qr_token::is_fresh(&claims, Utc::now().timestamp_millis(), self.token_ttl_seconds) {
            return Ok(Verdict::Rejected(RejectReason::ExpiredToken));
        }

        let session_id: SessionId = match claims.sid.parse() {
            Ok(id) => id,
            Err(_) => return Ok(Verdict::Rejected(RejectReason::InvalidToken)),
        };
        let session = match self.store.find_session(session_id).await? {
            Some(session) if session.is_active => session,
            _ => return Ok(Verdict::Rejected(RejectReason::SessionClosed)),
        };

        let settings = self.store.load_settings().await?;
        if !net::is_origin_allowed(origin, &settings) {
            return Ok(Verdict::Rejected(RejectReason::OriginNotAllowed));
        }

        let student = self
            .store
            .find_student(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;

        self.apply_binding(&session, &student, device_id).await
    }

    async fn apply_binding(
        &self,
        session: &ClassSession,
        student: &Student,
        device_id: &str,
    ) -> Result<Verdict, AppError> {
        match evaluate_binding(student.bound_device_id.as_deref(), device_id) {
            BindingOutcome::FirstUse => {
                if self
                    .store
                    .bind_and_mark(session.id, student.id, device_id)
                    .await?
                {
                    return Ok(Verdict::Accepted { newly_bound: true });
                }
                // Lost a concurrent first-scan race; the winner's binding
                // is now authoritative. Re-read and decide against it.
                let current = self
                    .store
                    .find_student(student.id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Student not found".to_string()))?;
                match evaluate_binding(current.bound_device_id.as_deref(), device_id) {
                    BindingOutcome::Match => {
                        self.store
                            .mark_attendance(session.id, current.id, device_id)
                            .await?;
                        Ok(Verdict::Accepted { newly_bound: false })
                    }
                    BindingOutcome::Mismatch => self.flag(session, &current, device_id).await,
                    BindingOutcome::FirstUse => Err(AppError::InternalServerError(
                        anyhow::anyhow!("conditional bind affected no rows for an unbound student"),
                    )),
                }
            }
            BindingOutcome::Match => {
                self.store
                    .mark_attendance(session.id, student.id, device_id)
                    .await?;
                Ok(Verdict::Accepted { newly_bound: false })
            }
            BindingOutcome::Mismatch => self.flag(session, student, device_id).await,
        }
    }

    /// The device does not belong to this student: record the attempt for
    /// administrative review. Not a silent reject.
    async fn flag(
        &self,
        session: &ClassSession,
        student: &Student,
        device_id: &str,
    ) -> Result<Verdict, AppError> {
        let owner = self.store.find_student_by_device(device_id).await?;
        let owner_id = owner.map(|owner| owner.id);
        self.store
            .record_proxy_attempt(student.id, device_id, owner_id, session.id)
            .await?;
        tracing::warn!(
            student_id = %student.id,
            session_id = %session.id,
            device_owner = ?owner_id,
            "proxy attempt recorded"
        );
        Ok(Verdict::Flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UserId;
    use crate::utils::qr_token::issue_attendance_token_at;
    use mockall::predicate::eq;

    const SECRET: &str = "engine-test-secret";
    const TTL: u64 = 30;

    fn active_session() -> ClassSession {
        ClassSession::new(crate::types::SubjectId::new())
    }

    fn student(bound: Option<&str>) -> Student {
        let mut student = Student::new(UserId::new(), "CS-001".into());
        student.bound_device_id = bound.map(str::to_string);
        student
    }

    fn open_settings() -> SystemSettings {
        SystemSettings::default()
    }

    fn fresh_token(session_id: SessionId) -> String {
        issue_attendance_token_at(session_id, Utc::now().timestamp_millis(), SECRET).unwrap()
    }

    fn engine(store: MockVerificationStore) -> VerificationEngine<MockVerificationStore> {
        VerificationEngine::new(store, SECRET, TTL)
    }

    #[tokio::test]
    async fn garbage_token_rejects_without_store_access() {
        let store = MockVerificationStore::new();
        let verdict = engine(store)
            .verify("garbage", "dev-1", Some("10.0.0.1"), StudentId::new())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectReason::InvalidToken));
    }

    #[tokio::test]
    async fn stale_token_rejects_as_expired() {
        let session = active_session();
        let stale = issue_attendance_token_at(
            session.id,
            Utc::now().timestamp_millis() - 31_000,
            SECRET,
        )
        .unwrap();
        let store = MockVerificationStore::new();
        let verdict = engine(store)
            .verify(&stale, "dev-1", None, StudentId::new())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectReason::ExpiredToken));
    }

    #[tokio::test]
    async fn inactive_session_rejects_as_closed() {
        let mut session = active_session();
        session.is_active = false;
        session.ended_at = Some(Utc::now());
        let token = fresh_token(session.id);

        let mut store = MockVerificationStore::new();
        let found = session.clone();
        store
            .expect_find_session()
            .with(eq(session.id))
            .returning(move |_| Ok(Some(found.clone())));

        let verdict = engine(store)
            .verify(&token, "dev-1", None, StudentId::new())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectReason::SessionClosed));
    }

    #[tokio::test]
    async fn unknown_session_rejects_as_closed() {
        let token = fresh_token(SessionId::new());
        let mut store = MockVerificationStore::new();
        store.expect_find_session().returning(|_| Ok(None));

        let verdict = engine(store)
            .verify(&token, "dev-1", None, StudentId::new())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectReason::SessionClosed));
    }

    #[tokio::test]
    async fn disallowed_origin_rejects() {
        let session = active_session();
        let token = fresh_token(session.id);

        let mut store = MockVerificationStore::new();
        let found = session.clone();
        store
            .expect_find_session()
            .returning(move |_| Ok(Some(found.clone())));
        store.expect_load_settings().returning(|| {
            Ok(SystemSettings {
                allowed_ip_prefix: "10.0.".into(),
                ip_check_enabled: true,
            })
        });

        let verdict = engine(store)
            .verify(&token, "dev-1", Some("192.168.1.1"), StudentId::new())
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectReason::OriginNotAllowed));
    }

    #[tokio::test]
    async fn first_scan_binds_and_accepts() {
        let session = active_session();
        let token = fresh_token(session.id);
        let student = student(None);
        let student_id = student.id;

        let mut store = MockVerificationStore::new();
        let found = session.clone();
        store
            .expect_find_session()
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_load_settings()
            .returning(|| Ok(open_settings()));
        let found_student = student.clone();
        store
            .expect_find_student()
            .with(eq(student_id))
            .returning(move |_| Ok(Some(found_student.clone())));
        store
            .expect_bind_and_mark()
            .withf(move |_, sid, device| *sid == student_id && device == "dev-1")
            .once()
            .returning(|_, _, _| Ok(true));

        let verdict = engine(store)
            .verify(&token, "dev-1", Some("10.0.5.2"), student_id)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Accepted { newly_bound: true });
    }

    #[tokio::test]
    async fn matching_device_accepts_without_rebinding() {
        let session = active_session();
        let token = fresh_token(session.id);
        let student = student(Some("dev-1"));
        let student_id = student.id;

        let mut store = MockVerificationStore::new();
        let found = session.clone();
        store
            .expect_find_session()
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_load_settings()
            .returning(|| Ok(open_settings()));
        let found_student = student.clone();
        store
            .expect_find_student()
            .returning(move |_| Ok(Some(found_student.clone())));
        store
            .expect_mark_attendance()
            .once()
            .returning(|_, _, _| Ok(()));

        let verdict = engine(store)
            .verify(&token, "dev-1", None, student_id)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Accepted { newly_bound: false });
    }

    #[tokio::test]
    async fn mismatched_device_flags_and_resolves_owner() {
        let session = active_session();
        let token = fresh_token(session.id);
        let claiming = student(Some("dev-1"));
        let claiming_id = claiming.id;
        let owner = student(Some("dev-2"));
        let owner_id = owner.id;

        let mut store = MockVerificationStore::new();
        let found = session.clone();
        store
            .expect_find_session()
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_load_settings()
            .returning(|| Ok(open_settings()));
        let found_student = claiming.clone();
        store
            .expect_find_student()
            .returning(move |_| Ok(Some(found_student.clone())));
        store
            .expect_find_student_by_device()
            .with(eq("dev-2"))
            .returning(move |_| Ok(Some(owner.clone())));
        store
            .expect_record_proxy_attempt()
            .withf(move |actor, device, found_owner, _| {
                *actor == claiming_id && device == "dev-2" && *found_owner == Some(owner_id)
            })
            .once()
            .returning(|_, _, _, _| Ok(()));
        store.expect_mark_attendance().never();

        let verdict = engine(store)
            .verify(&token, "dev-2", None, claiming_id)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Flagged);
    }

    #[tokio::test]
    async fn lost_bind_race_against_same_device_still_accepts() {
        // Two first scans from the same device: the loser re-reads, sees
        // its own device bound, and marks idempotently.
        let session = active_session();
        let token = fresh_token(session.id);
        let unbound = student(None);
        let student_id = unbound.id;
        let mut rebound = unbound.clone();
        rebound.bound_device_id = Some("dev-1".into());

        let mut store = MockVerificationStore::new();
        let found = session.clone();
        store
            .expect_find_session()
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_load_settings()
            .returning(|| Ok(open_settings()));
        let mut reads = vec![rebound.clone(), unbound.clone()];
        store
            .expect_find_student()
            .times(2)
            .returning(move |_| Ok(reads.pop()));
        store.expect_bind_and_mark().returning(|_, _, _| Ok(false));
        store
            .expect_mark_attendance()
            .once()
            .returning(|_, _, _| Ok(()));

        let verdict = engine(store)
            .verify(&token, "dev-1", None, student_id)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Accepted { newly_bound: false });
    }

    #[tokio::test]
    async fn lost_bind_race_against_other_device_flags() {
        // A proxy device raced the real one and lost: re-read shows a
        // different binding, so the scan is flagged, not accepted.
        let session = active_session();
        let token = fresh_token(session.id);
        let unbound = student(None);
        let student_id = unbound.id;
        let mut rebound = unbound.clone();
        rebound.bound_device_id = Some("dev-real".into());

        let mut store = MockVerificationStore::new();
        let found = session.clone();
        store
            .expect_find_session()
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_load_settings()
            .returning(|| Ok(open_settings()));
        let mut reads = vec![rebound.clone(), unbound.clone()];
        store
            .expect_find_student()
            .times(2)
            .returning(move |_| Ok(reads.pop()));
        store.expect_bind_and_mark().returning(|_, _, _| Ok(false));
        store
            .expect_find_student_by_device()
            .returning(|_| Ok(None));
        store
            .expect_record_proxy_attempt()
            .once()
            .returning(|_, _, _, _| Ok(()));
        store.expect_mark_attendance().never();

        let verdict = engine(store)
            .verify(&token, "dev-proxy", None, student_id)
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Flagged);
    }

    #[test]
    fn evaluate_binding_is_pure_and_total() {
        assert_eq!(evaluate_binding(None, "d"), BindingOutcome::FirstUse);
        assert_eq!(evaluate_binding(Some("d"), "d"), BindingOutcome::Match);
        assert_eq!(evaluate_binding(Some("e"), "d"), BindingOutcome::Mismatch);
    }

    #[test]
    fn reject_reasons_serialize_to_snake_case_codes() {
        assert_eq!(RejectReason::InvalidToken.as_str(), "invalid_token");
        assert_eq!(RejectReason::ExpiredToken.as_str(), "expired_token");
        assert_eq!(RejectReason::SessionClosed.as_str(), "session_closed");
        assert_eq!(
            RejectReason::OriginNotAllowed.as_str(),
            "origin_not_allowed"
        );
    }
}
