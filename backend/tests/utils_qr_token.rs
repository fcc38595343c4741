use scanmark_backend::types::SessionId;
use scanmark_backend::utils::qr_token::{
    is_fresh, issue_attendance_token, issue_attendance_token_at, verify_attendance_token,
    ATTENDANCE_TOKEN_TYPE,
};

const SECRET: &str = "integration-token-secret";

#[test]
fn token_carries_session_scope_and_type_tag() {
    let session_id = SessionId::new();
    let token = issue_attendance_token(session_id, SECRET).expect("issue");
    let claims = verify_attendance_token(&token, SECRET).expect("verify");
    assert_eq!(claims.sid, session_id.to_string());
    assert_eq!(claims.typ, ATTENDANCE_TOKEN_TYPE);
}

#[test]
fn verification_requires_the_issuer_secret() {
    let token = issue_attendance_token(SessionId::new(), SECRET).expect("issue");
    assert!(verify_attendance_token(&token, SECRET).is_ok());
    assert!(verify_attendance_token(&token, "some-other-secret").is_err());
    assert!(verify_attendance_token("", SECRET).is_err());
}

#[test]
fn tampered_tokens_do_not_verify() {
    let token = issue_attendance_token(SessionId::new(), SECRET).expect("issue");
    // Flip a character in the signature segment.
    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });
    assert!(verify_attendance_token(&tampered, SECRET).is_err());
}

#[test]
fn stale_token_still_decodes_but_reads_as_stale() {
    // The signature does not encode expiry; freshness is a separate check.
    let session_id = SessionId::new();
    let issued_at = 1_700_000_000_000i64;
    let token = issue_attendance_token_at(session_id, issued_at, SECRET).expect("issue");
    let claims = verify_attendance_token(&token, SECRET).expect("verify");

    assert!(is_fresh(&claims, issued_at, 30));
    assert!(is_fresh(&claims, issued_at + 29_999, 30));
    assert!(!is_fresh(&claims, issued_at + 30_000, 30));
    assert!(!is_fresh(&claims, issued_at + 86_400_000, 30));
}
