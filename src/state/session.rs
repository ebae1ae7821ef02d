//! Session state: the single source of truth for who is signed in.
//!
//! ARCHITECTURE
//! ============
//! `SessionState` owns the bearer token and the resolved profile. It is an
//! explicit object handed to whoever needs identity (pages, guards, the CLI),
//! never an ambient global. The token is the only durable piece of state; it
//! lives in one slot of a [`KeyValueStore`]. Profile and face-auth capability
//! are always re-derived from the server.
//!
//! INVARIANTS
//! ==========
//! A profile never outlives the token it was fetched for. Every token change
//! clears the profile and bumps `generation`; a profile response is applied
//! only if the generation it was requested under is still current, so a slow
//! fetch for an old token cannot overwrite state for a newer one.
//!
//! ERROR HANDLING
//! ==============
//! Sign-in operations never fail past this boundary: every outcome, including
//! transport and decode failures, is a [`LoginResult`]. Profile and
//! capability probes degrade silently (logged, prior state kept or a
//! negative default returned).

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use tokio::sync::{RwLock, watch};

use crate::net::api::AuthApi;
use crate::net::types::{
    ApiError, AuthTokens, ErrorBody, FaceAuthCapability, MessageResponse, SigninCredentials, Snapshot, UserProfile,
};
use crate::router::{Navigation, Route};
use crate::store::{KeyValueStore, TOKEN_KEY};

pub const LOGIN_FAILED_MESSAGE: &str = "Login failed.";
const FAILED_STATUS: u16 = 500;
const EMAIL_NOT_VERIFIED_STATUS: u16 = 403;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Outcome of a password or face sign-in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginResult {
    Success,
    /// 403 for an unconfirmed account. No state was touched.
    EmailNotVerified { message: String },
    /// Any other non-2xx response; `message` is the server's `detail`.
    Rejected { message: Option<String>, status: u16 },
    /// Transport or decode failure, reported as status 500.
    Failed { message: String },
}

impl LoginResult {
    #[must_use]
    pub fn success(&self) -> bool {
        matches!(self, Self::Success)
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success => None,
            Self::EmailNotVerified { .. } => Some(EMAIL_NOT_VERIFIED_STATUS),
            Self::Rejected { status, .. } => Some(*status),
            Self::Failed { .. } => Some(FAILED_STATUS),
        }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success => None,
            Self::EmailNotVerified { message } | Self::Failed { message } => Some(message.as_str()),
            Self::Rejected { message, .. } => message.as_deref(),
        }
    }

    fn failed() -> Self {
        Self::Failed { message: LOGIN_FAILED_MESSAGE.to_owned() }
    }
}

/// Point-in-time copy of the session, published to subscribers on change.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub profile: Option<UserProfile>,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

// =============================================================================
// SESSION STATE
// =============================================================================

#[derive(Debug, Default)]
struct Inner {
    token: Option<String>,
    profile: Option<UserProfile>,
    generation: u64,
}

impl Inner {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot { token: self.token.clone(), profile: self.profile.clone() }
    }

    /// Install a new token (or none), dropping the profile. Returns the new generation.
    fn replace_token(&mut self, token: Option<String>) -> u64 {
        self.token = token;
        self.profile = None;
        self.generation += 1;
        self.generation
    }
}

pub struct SessionState<A, S> {
    api: A,
    store: S,
    inner: RwLock<Inner>,
    changes: watch::Sender<SessionSnapshot>,
}

impl<A: AuthApi, S: KeyValueStore> SessionState<A, S> {
    /// Build the container, adopting any token already persisted in `store`.
    /// The profile stays empty until [`SessionState::restore`] runs.
    pub fn new(api: A, store: S) -> Self {
        let inner = Inner { token: store.get(TOKEN_KEY), ..Inner::default() };
        let (changes, _) = watch::channel(inner.snapshot());
        Self { api, store, inner: RwLock::new(inner), changes }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Receive a fresh [`SessionSnapshot`] every time token or profile changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.changes.subscribe()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn profile(&self) -> Option<UserProfile> {
        self.inner.read().await.profile.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.token.is_some()
    }

    /// Fetch the profile for the token adopted at construction, if any.
    pub async fn restore(&self) {
        let (token, generation) = {
            let inner = self.inner.read().await;
            (inner.token.clone(), inner.generation)
        };
        if let Some(token) = token {
            self.fetch_for_generation(&token, generation).await;
        }
    }

    /// Sign in with email and password.
    pub async fn login(&self, credentials: &SigninCredentials) -> LoginResult {
        match self.api.signin(credentials).await {
            Ok(tokens) => self.adopt_tokens(tokens).await,
            Err(err) => login_failure(err),
        }
    }

    /// Sign in with a captured frame. The backend identifies the account from
    /// the ambient identity cookie, not from the bearer token.
    pub async fn login_with_face(&self, image: &Snapshot) -> LoginResult {
        match self.api.signin_via_face(image).await {
            Ok(tokens) if tokens.success == Some(true) => self.adopt_tokens(tokens).await,
            Ok(_) => {
                tracing::warn!("face sign-in response did not report success");
                LoginResult::failed()
            }
            Err(err) => login_failure(err),
        }
    }

    /// Overwrite the token in memory and in the store, then refetch the profile.
    /// The token's shape is not checked. Store and memory are written under
    /// the same lock.
    pub async fn refresh_token(&self, token: impl Into<String>) {
        let token = token.into();
        let generation = {
            let mut inner = self.inner.write().await;
            if let Err(e) = self.store.set(TOKEN_KEY, &token) {
                tracing::warn!(error = %e, "failed to persist session token");
            }
            inner.replace_token(Some(token.clone()))
        };
        self.publish().await;
        self.fetch_for_generation(&token, generation).await;
    }

    /// Fetch the profile for `token` and install it if `token` is still the
    /// current one. `None` is a no-op.
    pub async fn fetch_user_info(&self, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };
        let generation = self.inner.read().await.generation;
        self.fetch_for_generation(token, generation).await;
    }

    /// Ask the backend whether the ambient identity cookie allows face sign-in.
    pub async fn check_face_auth(&self) -> FaceAuthCapability {
        match self.api.check_face_auth().await {
            Ok(capability) => capability,
            Err(e) => {
                tracing::warn!(error = %e, "face auth capability probe failed");
                FaceAuthCapability::default()
            }
        }
    }

    /// Register `image` as the signed-in user's face.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthenticated`] without a session token, or the
    /// backend/transport error from the upload.
    pub async fn register_face(&self, image: &Snapshot) -> Result<MessageResponse, ApiError> {
        let token = self.token().await.ok_or(ApiError::Unauthenticated)?;
        let ack = self.api.register_face(&token, image).await?;
        tracing::info!("face registered");
        Ok(ack)
    }

    /// Clear the persisted token, token and profile, and return the
    /// navigation to the home page.
    pub async fn logout(&self) -> Navigation {
        {
            let mut inner = self.inner.write().await;
            if let Err(e) = self.store.remove(TOKEN_KEY) {
                tracing::warn!(error = %e, "failed to remove persisted session token");
            }
            inner.replace_token(None);
        }
        self.publish().await;
        tracing::info!("signed out");
        Navigation::to(Route::Home)
    }

    async fn adopt_tokens(&self, tokens: AuthTokens) -> LoginResult {
        match tokens.access_token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.refresh_token(token).await;
                tracing::info!("signed in");
                LoginResult::Success
            }
            None => {
                tracing::warn!("sign-in response carried no access token");
                LoginResult::failed()
            }
        }
    }

    async fn fetch_for_generation(&self, token: &str, generation: u64) {
        let profile = match self.api.fetch_profile(token).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status(), "failed to fetch user info");
                return;
            }
        };

        {
            let mut inner = self.inner.write().await;
            if inner.generation != generation || inner.token.as_deref() != Some(token) {
                tracing::debug!(generation, current = inner.generation, "discarding stale profile response");
                return;
            }
            inner.profile = Some(profile);
        }
        self.publish().await;
    }

    async fn publish(&self) {
        let snapshot = self.inner.read().await.snapshot();
        self.changes.send_replace(snapshot);
    }
}

fn login_failure(err: ApiError) -> LoginResult {
    match err {
        ApiError::Status { status: EMAIL_NOT_VERIFIED_STATUS, body } if body.is_email_not_verified() => {
            LoginResult::EmailNotVerified { message: email_not_verified_message(&body) }
        }
        ApiError::Status { status, body } => LoginResult::Rejected { message: body.detail, status },
        other => {
            tracing::warn!(error = %other, "sign-in request failed");
            LoginResult::failed()
        }
    }
}

fn email_not_verified_message(body: &ErrorBody) -> String {
    let detail = body.detail.as_deref().unwrap_or_default().trim().trim_end_matches('.');
    match body.email.as_deref() {
        Some(email) => format!("{detail}. A verification email has been sent to {email}."),
        None => format!("{detail}."),
    }
}
