//! Page controllers.
//!
//! ARCHITECTURE
//! ============
//! Each page turns form input into calls on the API or the session container
//! and reports back a [`PageOutcome`]: an optional status line for the form
//! and an optional navigation. Rendering is left to the front end (the CLI
//! prints; a GUI would draw), so every branch here is plain data and easy to
//! test.
//!
//! ERROR HANDLING
//! ==============
//! No page returns an error. Every failure path ends in a user-visible
//! [`FormMessage`] or a redirect.

pub mod confirm_signup;
pub mod face_registration;
pub mod profile;
pub mod signin;
pub mod signup;

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::fmt;

use crate::net::api::AuthApi;
use crate::router::{Navigation, Resolution, Route, guard};
use crate::state::SessionState;
use crate::store::KeyValueStore;

pub const HOME_TITLE: &str = "Welcome to FaceAuth";
pub const HOME_TAGLINE: &str = "Secure authentication using facial recognition";

/// Status line shown above a form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormMessage {
    pub text: String,
    pub is_error: bool,
}

impl FormMessage {
    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }
}

impl fmt::Display for FormMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageOutcome {
    pub message: Option<FormMessage>,
    pub navigate: Option<Navigation>,
}

impl PageOutcome {
    pub fn error(text: impl Into<String>) -> Self {
        Self { message: Some(FormMessage::error(text)), navigate: None }
    }

    #[must_use]
    pub fn navigate(navigation: Navigation) -> Self {
        Self { message: None, navigate: Some(navigation) }
    }

    #[must_use]
    pub fn with_info(mut self, text: impl Into<String>) -> Self {
        self.message = Some(FormMessage::info(text));
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.message.as_ref().is_some_and(|m| m.is_error)
    }
}

/// Resolve a visit to `path` against the current session: the page it
/// renders, or where the guard sends the caller instead. `None` for an
/// unknown path.
pub async fn visit<A, S>(session: &SessionState<A, S>, path: &str) -> Option<Resolution>
where
    A: AuthApi,
    S: KeyValueStore,
{
    let route = Route::from_path(path)?;
    Some(guard(route, session.is_authenticated().await))
}

/// Run the route guard for `route` against the current session. Returns the
/// redirect to follow, or `None` when the page may render.
pub async fn require_session<A, S>(session: &SessionState<A, S>, route: Route) -> Option<Navigation>
where
    A: AuthApi,
    S: KeyValueStore,
{
    match guard(route, session.is_authenticated().await) {
        Resolution::Render(_) => None,
        Resolution::Redirect(target) => {
            tracing::debug!(from = %route, to = %target, "redirecting unauthenticated visit");
            Some(Navigation::to(target))
        }
    }
}
