//! Sign-in page: password form plus optional face sign-in.
//!
//! On load the page probes whether the browser-equivalent identity cookie
//! allows face sign-in; the face option is only offered when it does.

#[cfg(test)]
#[path = "signin_test.rs"]
mod signin_test;

use super::PageOutcome;
use crate::net::api::AuthApi;
use crate::net::types::{FaceAuthCapability, SigninCredentials};
use crate::router::{Navigation, Route};
use crate::state::session::{LOGIN_FAILED_MESSAGE, LoginResult, SessionState};
use crate::state::CaptureFlow;
use crate::state::capture::{CaptureError, CaptureOutcome};
use crate::store::KeyValueStore;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";
pub const MISSING_FIELDS: &str = "Email and password are required.";
pub const FACE_SIGNIN_FAILED: &str = "Face sign-in failed. Please try again.";
pub const CAPTURE_FIRST: &str = "Capture a photo first.";
pub const SIGNED_IN: &str = "Signed in.";

/// What the page shows when first opened.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SigninPage {
    /// Email to prefill: the one handed over by the previous page, otherwise
    /// the one the face-auth probe reported.
    pub email: String,
    pub face_auth: FaceAuthCapability,
}

impl SigninPage {
    #[must_use]
    pub fn offers_face_signin(&self) -> bool {
        self.face_auth.can_use_face_auth
    }
}

pub async fn load<A, S>(session: &SessionState<A, S>, prefill_email: Option<&str>) -> SigninPage
where
    A: AuthApi,
    S: KeyValueStore,
{
    let face_auth = session.check_face_auth().await;
    let email = prefill_email
        .map(str::to_owned)
        .or_else(|| face_auth.email.clone())
        .unwrap_or_default();
    SigninPage { email, face_auth }
}

/// User-visible text for a failed sign-in. `None` for success.
#[must_use]
pub fn login_message(result: &LoginResult) -> Option<String> {
    match result {
        LoginResult::Success => None,
        LoginResult::EmailNotVerified { message } | LoginResult::Failed { message } => Some(message.clone()),
        LoginResult::Rejected { status: 401, .. } => Some(INVALID_CREDENTIALS.to_owned()),
        LoginResult::Rejected { message, .. } => Some(message.clone().unwrap_or_else(|| LOGIN_FAILED_MESSAGE.to_owned())),
    }
}

pub async fn submit_password<A, S>(session: &SessionState<A, S>, email: &str, password: &str) -> PageOutcome
where
    A: AuthApi,
    S: KeyValueStore,
{
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return PageOutcome::error(MISSING_FIELDS);
    }

    let credentials = SigninCredentials { email: email.to_owned(), password: password.to_owned() };
    let result = session.login(&credentials).await;
    match login_message(&result) {
        None => PageOutcome::navigate(Navigation::to(Route::Profile)).with_info(SIGNED_IN),
        Some(message) => PageOutcome::error(message),
    }
}

/// Submit the captured frame for face sign-in.
pub async fn submit_face<A, S>(session: &SessionState<A, S>, flow: &mut CaptureFlow) -> PageOutcome
where
    A: AuthApi,
    S: KeyValueStore,
{
    let frame = match flow.begin_submit() {
        Ok(frame) => frame,
        Err(CaptureError::Busy) => return PageOutcome::default(),
        Err(_) => return PageOutcome::error(CAPTURE_FIRST),
    };

    let result = session.login_with_face(&frame).await;
    if result.success() {
        flow.finish(CaptureOutcome { success: true, message: SIGNED_IN.to_owned() });
        return PageOutcome::navigate(Navigation::to(Route::Profile)).with_info(SIGNED_IN);
    }

    tracing::debug!(status = ?result.status(), detail = ?result.message(), "face sign-in rejected");
    flow.finish(CaptureOutcome { success: false, message: FACE_SIGNIN_FAILED.to_owned() });
    PageOutcome::error(FACE_SIGNIN_FAILED)
}
