//! Email confirmation form.

#[cfg(test)]
#[path = "confirm_signup_test.rs"]
mod confirm_signup_test;

use super::PageOutcome;
use crate::net::api::AuthApi;
use crate::net::types::{ApiError, ConfirmSignupRequest};
use crate::router::{Navigation, Route};

pub const MISSING_FIELDS: &str = "Email and confirmation code are required.";
pub const CONFIRM_FAILED: &str = "Failed to confirm signup";
pub const CONFIRM_ERROR: &str = "An error occurred during confirmation. Please try again.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmSignupForm {
    pub email: String,
    pub code: String,
}

/// Confirm the account. Only a successful confirmation moves on to sign-in;
/// a rejected code keeps the user on this form.
pub async fn submit<A: AuthApi + ?Sized>(api: &A, form: &ConfirmSignupForm) -> PageOutcome {
    let email = form.email.trim();
    let code = form.code.trim();
    if email.is_empty() || code.is_empty() {
        return PageOutcome::error(MISSING_FIELDS);
    }

    let request = ConfirmSignupRequest { email: email.to_owned(), code: code.to_owned() };
    match api.confirm_signup(&request).await {
        Ok(ack) => {
            let outcome = PageOutcome::navigate(Navigation::with_email(Route::Signin, request.email));
            match ack.message {
                Some(message) => outcome.with_info(message),
                None => outcome,
            }
        }
        Err(ApiError::Status { body, .. }) => PageOutcome::error(body.detail.unwrap_or_else(|| CONFIRM_FAILED.to_owned())),
        Err(e) => {
            tracing::warn!(error = %e, "confirm signup request failed");
            PageOutcome::error(CONFIRM_ERROR)
        }
    }
}
