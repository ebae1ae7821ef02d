//! Profile page (protected).

#[cfg(test)]
#[path = "profile_test.rs"]
mod profile_test;

use super::{PageOutcome, require_session};
use crate::net::api::AuthApi;
use crate::net::types::UserProfile;
use crate::router::{Navigation, Route};
use crate::state::session::SessionState;
use crate::store::{KeyValueStore, TOKEN_KEY};

pub const LOADING: &str = "Loading user information...";
pub const SETUP_FACE_AUTH: &str = "Setup Face Authentication";
pub const UPDATE_FACE_AUTH: &str = "Update Face Authentication";
pub const SIGNED_OUT: &str = "Signed out.";
pub const LOGOUT_NOT_SAVED: &str = "Signed out, but the saved session could not be removed.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProfileView {
    /// Token present, profile not fetched (yet, or the fetch failed).
    Loading,
    Ready(UserProfile),
}

impl ProfileView {
    #[must_use]
    pub fn from_profile(profile: Option<UserProfile>) -> Self {
        profile.map_or(Self::Loading, Self::Ready)
    }

    /// Label of the button leading to [`Route::RegisterFace`].
    #[must_use]
    pub fn face_action_label(&self) -> Option<&'static str> {
        match self {
            Self::Loading => None,
            Self::Ready(profile) if profile.has_face_auth() => Some(UPDATE_FACE_AUTH),
            Self::Ready(_) => Some(SETUP_FACE_AUTH),
        }
    }

    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let Self::Ready(profile) = self else {
            return vec![LOADING.to_owned()];
        };
        let yes_no = if profile.email_verified { "Yes" } else { "No" };
        let face = if profile.has_face_auth() { "Enabled" } else { "Not Enabled" };
        vec![
            format!("Username: {}", profile.username),
            format!("Email: {}", profile.email),
            format!("Email Verified: {yes_no}"),
            format!("Face Authentication: {face}"),
        ]
    }
}

/// Render the page, or the redirect to follow when there is no session.
///
/// # Errors
///
/// Returns the sign-in [`Navigation`] when the guard rejects the visit.
pub async fn load<A, S>(session: &SessionState<A, S>) -> Result<ProfileView, Navigation>
where
    A: AuthApi,
    S: KeyValueStore,
{
    if let Some(redirect) = require_session(session, Route::Profile).await {
        return Err(redirect);
    }
    Ok(ProfileView::from_profile(session.profile().await))
}

pub async fn logout<A, S>(session: &SessionState<A, S>) -> PageOutcome
where
    A: AuthApi,
    S: KeyValueStore,
{
    let home = session.logout().await;
    if session.store().get(TOKEN_KEY).is_some() {
        // The next run would restore the session from disk.
        return PageOutcome { navigate: Some(home), ..PageOutcome::error(LOGOUT_NOT_SAVED) };
    }
    PageOutcome::navigate(home).with_info(SIGNED_OUT)
}
