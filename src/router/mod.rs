//! Route table and the authentication guard.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every protected view applies the same rule: no session token means the
//! caller is sent to sign-in. There are no roles or claims; presence of a
//! token is the only input.

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Signup,
    ConfirmSignup,
    Signin,
    Profile,
    RegisterFace,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Home,
        Route::Signup,
        Route::ConfirmSignup,
        Route::Signin,
        Route::Profile,
        Route::RegisterFace,
    ];

    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Signup => "/signup",
            Route::ConfirmSignup => "/confirm-signup",
            Route::Signin => "/signin",
            Route::Profile => "/me",
            Route::RegisterFace => "/register-face",
        }
    }

    /// Look up a route by path. Query strings, fragments and a trailing
    /// slash are ignored.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL.into_iter().find(|r| r.path() == normalized)
    }

    /// Routes that require a session token.
    #[must_use]
    pub fn is_protected(self) -> bool {
        matches!(self, Route::Profile | Route::RegisterFace)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of running the guard for a requested route.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Render(Route),
    Redirect(Route),
}

impl Resolution {
    /// The route that actually ends up on screen.
    #[must_use]
    pub fn route(self) -> Route {
        match self {
            Resolution::Render(r) | Resolution::Redirect(r) => r,
        }
    }
}

#[must_use]
pub fn guard(route: Route, has_token: bool) -> Resolution {
    if route.is_protected() && !has_token {
        Resolution::Redirect(Route::Signin)
    } else {
        Resolution::Render(route)
    }
}

/// A client-side navigation, optionally carrying an email to prefill on the
/// destination form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub route: Route,
    pub email: Option<String>,
}

impl Navigation {
    #[must_use]
    pub fn to(route: Route) -> Self {
        Self { route, email: None }
    }

    #[must_use]
    pub fn with_email(route: Route, email: impl Into<String>) -> Self {
        Self { route, email: Some(email.into()) }
    }
}
