//! Account registration form.

#[cfg(test)]
#[path = "signup_test.rs"]
mod signup_test;

use super::PageOutcome;
use crate::net::api::AuthApi;
use crate::net::types::{ApiError, SignupRequest};
use crate::router::{Navigation, Route};

pub const MISSING_FIELDS: &str = "All fields are required.";
pub const PASSWORD_MISMATCH: &str = "Passwords do not match.";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
pub const SIGNUP_ERROR: &str = "An error occurred during signup. Please try again.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    fn validate(&self) -> Result<SignupRequest, &'static str> {
        let email = self.email.trim();
        let username = self.username.trim();
        if email.is_empty() || username.is_empty() || self.password.is_empty() {
            return Err(MISSING_FIELDS);
        }
        if self.password != self.confirm_password {
            return Err(PASSWORD_MISMATCH);
        }
        Ok(SignupRequest { email: email.to_owned(), username: username.to_owned(), password: self.password.clone() })
    }
}

/// Register the account; on success continue to confirmation with the
/// email prefilled.
pub async fn submit<A: AuthApi + ?Sized>(api: &A, form: &SignupForm) -> PageOutcome {
    let request = match form.validate() {
        Ok(request) => request,
        Err(message) => return PageOutcome::error(message),
    };

    match api.signup(&request).await {
        Ok(ack) => {
            tracing::info!("signup accepted");
            let outcome = PageOutcome::navigate(Navigation::with_email(Route::ConfirmSignup, request.email));
            match ack.message {
                Some(message) => outcome.with_info(message),
                None => outcome,
            }
        }
        Err(ApiError::Status { body, .. }) => PageOutcome::error(body.detail.unwrap_or_else(|| REGISTRATION_FAILED.to_owned())),
        Err(e) => {
            tracing::warn!(error = %e, "signup request failed");
            PageOutcome::error(SIGNUP_ERROR)
        }
    }
}
