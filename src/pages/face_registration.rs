//! Face registration page (protected).
//!
//! Uploads the captured frame under the session's bearer token. After a
//! successful upload the profile is refetched so `face_image_key` (and with it
//! the profile page's "Face Authentication" line) reflects the new face.

#[cfg(test)]
#[path = "face_registration_test.rs"]
mod face_registration_test;

use super::{PageOutcome, require_session};
use crate::net::api::AuthApi;
use crate::net::types::ApiError;
use crate::router::{Navigation, Route};
use crate::state::CaptureFlow;
use crate::state::capture::{CaptureError, CaptureOutcome};
use crate::state::session::SessionState;
use crate::store::KeyValueStore;

pub const FACE_REGISTERED: &str = "Face registered successfully.";
pub const FACE_REGISTRATION_FAILED: &str = "Face registration failed. Please try again.";
pub const CAPTURE_FIRST: &str = "Capture a photo first.";

/// Page entry: `Some` redirect when there is no session.
pub async fn enter<A, S>(session: &SessionState<A, S>) -> Option<Navigation>
where
    A: AuthApi,
    S: KeyValueStore,
{
    require_session(session, Route::RegisterFace).await
}

pub async fn submit<A, S>(session: &SessionState<A, S>, flow: &mut CaptureFlow) -> PageOutcome
where
    A: AuthApi,
    S: KeyValueStore,
{
    if let Some(redirect) = enter(session).await {
        return PageOutcome::navigate(redirect);
    }

    let frame = match flow.begin_submit() {
        Ok(frame) => frame,
        Err(CaptureError::Busy) => return PageOutcome::default(),
        Err(_) => return PageOutcome::error(CAPTURE_FIRST),
    };

    match session.register_face(&frame).await {
        Ok(ack) => {
            let message = ack.message.unwrap_or_else(|| FACE_REGISTERED.to_owned());
            flow.finish(CaptureOutcome { success: true, message: message.clone() });
            let token = session.token().await;
            session.fetch_user_info(token.as_deref()).await;
            PageOutcome::default().with_info(message)
        }
        Err(ApiError::Unauthenticated) => {
            // Session ended while the upload was being prepared.
            flow.finish(CaptureOutcome { success: false, message: FACE_REGISTRATION_FAILED.to_owned() });
            PageOutcome::navigate(Navigation::to(Route::Signin))
        }
        Err(e) => {
            tracing::warn!(error = %e, "face registration failed");
            let message = e.detail().map_or_else(|| FACE_REGISTRATION_FAILED.to_owned(), str::to_owned);
            flow.finish(CaptureOutcome { success: false, message: message.clone() });
            PageOutcome::error(message)
        }
    }
}
