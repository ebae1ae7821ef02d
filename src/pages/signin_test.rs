use super::*;
use crate::net::types::Snapshot;
use crate::state::FrameSource;
use crate::state::capture::CapturePhase;
use crate::store::{MemoryStore, TOKEN_KEY};
use crate::test_helpers::{MockApi, Reply};

struct OneFrame;

impl FrameSource for OneFrame {
    fn capture(&mut self) -> Result<Snapshot, CaptureError> {
        Ok(Snapshot::jpeg(vec![0xFF, 0xD8, 0xFF]))
    }
}

fn captured() -> CaptureFlow {
    let mut flow = CaptureFlow::new();
    flow.capture(&mut OneFrame).unwrap();
    flow
}

// =============================================================
// load
// =============================================================

#[tokio::test]
async fn load_offers_face_signin_with_probe_email() {
    let capability = FaceAuthCapability { can_use_face_auth: true, email: Some("face@b.com".into()) };
    let session = SessionState::new(MockApi::new().with_capability(Some(capability)), MemoryStore::new());

    let page = load(&session, None).await;
    assert!(page.offers_face_signin());
    assert_eq!(page.email, "face@b.com");
}

#[tokio::test]
async fn load_prefers_handed_over_email() {
    let capability = FaceAuthCapability { can_use_face_auth: true, email: Some("face@b.com".into()) };
    let session = SessionState::new(MockApi::new().with_capability(Some(capability)), MemoryStore::new());

    let page = load(&session, Some("typed@b.com")).await;
    assert_eq!(page.email, "typed@b.com");
}

#[tokio::test]
async fn load_probe_failure_hides_face_signin() {
    let session = SessionState::new(MockApi::new().with_capability(None), MemoryStore::new());
    let page = load(&session, None).await;
    assert!(!page.offers_face_signin());
    assert_eq!(page.email, "");
}

// =============================================================
// login_message
// =============================================================

#[test]
fn login_message_mapping() {
    assert_eq!(login_message(&LoginResult::Success), None);
    assert_eq!(
        login_message(&LoginResult::Rejected { message: Some("Invalid credentials".into()), status: 401 }).as_deref(),
        Some(INVALID_CREDENTIALS)
    );
    assert_eq!(
        login_message(&LoginResult::Rejected { message: Some("Locked".into()), status: 423 }).as_deref(),
        Some("Locked")
    );
    assert_eq!(
        login_message(&LoginResult::Rejected { message: None, status: 422 }).as_deref(),
        Some(LOGIN_FAILED_MESSAGE)
    );
    assert_eq!(
        login_message(&LoginResult::Failed { message: LOGIN_FAILED_MESSAGE.into() }).as_deref(),
        Some(LOGIN_FAILED_MESSAGE)
    );
    assert_eq!(
        login_message(&LoginResult::EmailNotVerified { message: "Email not verified.".into() }).as_deref(),
        Some("Email not verified.")
    );
}

// =============================================================
// submit_password
// =============================================================

#[tokio::test]
async fn wrong_password_shows_invalid_credentials() {
    let api = MockApi::new().with_signin(Reply::Status(401, r#"{"detail":"Invalid credentials"}"#));
    let session = SessionState::new(api, MemoryStore::new());

    let outcome = submit_password(&session, "a@b.com", "wrong").await;
    assert_eq!(outcome, PageOutcome::error(INVALID_CREDENTIALS));
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn unverified_email_shows_server_message() {
    let api = MockApi::new().with_signin(Reply::Status(403, r#"{"detail":"Email not verified","email":"a@b.com"}"#));
    let session = SessionState::new(api, MemoryStore::new());

    let outcome = submit_password(&session, "a@b.com", "pw").await;
    let message = outcome.message.unwrap();
    assert!(message.is_error);
    assert!(message.text.starts_with("Email not verified"));
}

#[tokio::test]
async fn success_navigates_to_profile() {
    let session = SessionState::new(MockApi::new(), MemoryStore::new());
    let outcome = submit_password(&session, "a@b.com", "pw").await;
    assert_eq!(outcome.navigate, Some(Navigation::to(Route::Profile)));
    assert!(!outcome.is_error());
    assert_eq!(session.store().get(TOKEN_KEY).as_deref(), Some("tok"));
}

#[tokio::test]
async fn blank_password_is_caught_locally() {
    let session = SessionState::new(MockApi::new(), MemoryStore::new());
    assert_eq!(submit_password(&session, "a@b.com", "").await, PageOutcome::error(MISSING_FIELDS));
    assert!(session.api().calls().is_empty());
}

// =============================================================
// submit_face
// =============================================================

#[tokio::test]
async fn face_signin_success() {
    let session = SessionState::new(MockApi::new(), MemoryStore::new());
    let mut flow = captured();

    let outcome = submit_face(&session, &mut flow).await;
    assert_eq!(outcome.navigate, Some(Navigation::to(Route::Profile)));
    assert!(flow.outcome().unwrap().success);
    assert_eq!(session.token().await.as_deref(), Some("face-tok"));
}

#[tokio::test]
async fn face_signin_without_capture() {
    let session = SessionState::new(MockApi::new(), MemoryStore::new());
    let mut flow = CaptureFlow::new();

    assert_eq!(submit_face(&session, &mut flow).await, PageOutcome::error(CAPTURE_FIRST));
    assert_eq!(flow.phase(), &CapturePhase::Idle);
    assert!(session.api().calls().is_empty());
}

#[tokio::test]
async fn face_signin_rejection_allows_retake() {
    let api = MockApi::new().with_signin_via_face(Reply::Status(401, r#"{"detail":"Face does not match"}"#));
    let session = SessionState::new(api, MemoryStore::new());
    let mut flow = captured();

    let outcome = submit_face(&session, &mut flow).await;
    assert_eq!(outcome, PageOutcome::error(FACE_SIGNIN_FAILED));
    assert!(!session.is_authenticated().await);
    assert!(!flow.outcome().unwrap().success);
    flow.retake().unwrap();
    assert_eq!(flow.phase(), &CapturePhase::Idle);
}

#[tokio::test]
async fn face_signin_transport_failure_is_generic() {
    let api = MockApi::new().with_signin_via_face(Reply::Broken);
    let session = SessionState::new(api, MemoryStore::new());
    let mut flow = captured();

    assert_eq!(submit_face(&session, &mut flow).await, PageOutcome::error(FACE_SIGNIN_FAILED));
}
