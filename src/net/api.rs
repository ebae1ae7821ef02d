//! REST client for the `/registration/*` backend endpoints.
//!
//! DESIGN
//! ======
//! [`AuthApi`] is the seam the session container talks through, so tests can
//! swap the network for a scripted mock. [`HttpAuthApi`] is the `reqwest`
//! implementation. It owns a cookie jar that plays the role of the browser's
//! ambient cookies: `signin_via_face` and `check_face_auth` authenticate with
//! the identity cookie the backend set earlier, never with the bearer token.
//!
//! ERROR HANDLING
//! ==============
//! Every non-2xx response becomes [`ApiError::Status`] with the decoded
//! error body; interpreting statuses is left to the caller.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::types::{
    ApiError, AuthTokens, ConfirmSignupRequest, ErrorBody, FaceAuthCapability, MessageResponse, ProfileEnvelope,
    SigninCredentials, SignupRequest, Snapshot, UserProfile,
};
use crate::config::ClientConfig;

pub const SIGNIN_PATH: &str = "/registration/signin";
pub const SIGNIN_VIA_FACE_PATH: &str = "/registration/signin_via_face";
pub const SIGNUP_PATH: &str = "/registration/signup";
pub const CONFIRM_SIGNUP_PATH: &str = "/registration/confirm_signup";
pub const PROFILE_PATH: &str = "/registration/me";
pub const REGISTER_FACE_PATH: &str = "/registration/register_user_face";
pub const CHECK_FACE_AUTH_PATH: &str = "/registration/check_face_auth";

/// URL the backend's cookies are scoped under. Cookies set without an
/// explicit `Path` default to `/registration`.
const COOKIE_SCOPE_PATH: &str = "/registration/";

// =============================================================================
// TRAIT
// =============================================================================

/// The remote face-authentication API. Enables mocking in tests.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /registration/signin` with JSON credentials.
    async fn signin(&self, credentials: &SigninCredentials) -> Result<AuthTokens, ApiError>;

    /// `POST /registration/signin_via_face` with the frame as multipart `image`.
    async fn signin_via_face(&self, image: &Snapshot) -> Result<AuthTokens, ApiError>;

    /// `POST /registration/signup`.
    async fn signup(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError>;

    /// `POST /registration/confirm_signup`.
    async fn confirm_signup(&self, request: &ConfirmSignupRequest) -> Result<MessageResponse, ApiError>;

    /// `GET /registration/me` with `Authorization: Bearer <token>`.
    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, ApiError>;

    /// `POST /registration/register_user_face` with bearer auth and multipart `image`.
    async fn register_face(&self, token: &str, image: &Snapshot) -> Result<MessageResponse, ApiError>;

    /// `POST /registration/check_face_auth`, authenticated by ambient cookie only.
    async fn check_face_auth(&self) -> Result<FaceAuthCapability, ApiError>;
}

#[async_trait::async_trait]
impl<T: AuthApi + ?Sized> AuthApi for Arc<T> {
    async fn signin(&self, credentials: &SigninCredentials) -> Result<AuthTokens, ApiError> {
        (**self).signin(credentials).await
    }

    async fn signin_via_face(&self, image: &Snapshot) -> Result<AuthTokens, ApiError> {
        (**self).signin_via_face(image).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
        (**self).signup(request).await
    }

    async fn confirm_signup(&self, request: &ConfirmSignupRequest) -> Result<MessageResponse, ApiError> {
        (**self).confirm_signup(request).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        (**self).fetch_profile(token).await
    }

    async fn register_face(&self, token: &str, image: &Snapshot) -> Result<MessageResponse, ApiError> {
        (**self).register_face(token, image).await
    }

    async fn check_face_auth(&self) -> Result<FaceAuthCapability, ApiError> {
        (**self).check_face_auth().await
    }
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

pub struct HttpAuthApi {
    http: reqwest::Client,
    base_url: String,
    cookies: Arc<Jar>,
    cookie_url: Url,
}

impl HttpAuthApi {
    /// Build a client for `config.backend_url` with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if the backend URL does not parse,
    /// or [`ApiError::HttpClientBuild`] if the TLS/HTTP stack fails to start.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let base_url = crate::config::normalize_base_url(&config.backend_url);
        let cookie_url = Url::parse(&format!("{base_url}{COOKIE_SCOPE_PATH}"))
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        let cookies = Arc::new(Jar::default());
        let mut builder = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&cookies))
            .connect_timeout(config.connect_timeout);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, base_url, cookies, cookie_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Load previously saved cookies (a `Cookie` header value, `a=b; c=d`).
    pub fn seed_cookies(&self, header: &str) {
        for pair in header.split(';').map(str::trim).filter(|p| p.contains('=')) {
            self.cookies.add_cookie_str(pair, &self.cookie_url);
        }
    }

    /// Current ambient cookies as a `Cookie` header value, for saving.
    #[must_use]
    pub fn cookie_header(&self) -> Option<String> {
        self.cookies
            .cookies(&self.cookie_url)
            .and_then(|v| v.to_str().ok().map(str::to_owned))
            .filter(|v| !v.is_empty())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn image_form(image: &Snapshot) -> Result<Form, ApiError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name())
            .mime_str(&image.mime)?;
        Ok(Form::new().part("image", part))
    }
}

/// Decode a 2xx body as `T`, or turn the response into [`ApiError::Status`].
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        tracing::debug!(status = status.as_u16(), "backend rejected request");
        return Err(ApiError::Status { status: status.as_u16(), body: ErrorBody::parse(&text) });
    }

    Ok(serde_json::from_str(&text)?)
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthApi {
    async fn signin(&self, credentials: &SigninCredentials) -> Result<AuthTokens, ApiError> {
        let response = self.http.post(self.url(SIGNIN_PATH)).json(credentials).send().await?;
        decode(response).await
    }

    async fn signin_via_face(&self, image: &Snapshot) -> Result<AuthTokens, ApiError> {
        let form = Self::image_form(image)?;
        let response = self
            .http
            .post(self.url(SIGNIN_VIA_FACE_PATH))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn signup(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
        let response = self.http.post(self.url(SIGNUP_PATH)).json(request).send().await?;
        decode(response).await
    }

    async fn confirm_signup(&self, request: &ConfirmSignupRequest) -> Result<MessageResponse, ApiError> {
        let response = self
            .http
            .post(self.url(CONFIRM_SIGNUP_PATH))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        let response = self.http.get(self.url(PROFILE_PATH)).bearer_auth(token).send().await?;
        let envelope: ProfileEnvelope = decode(response).await?;
        Ok(envelope.data)
    }

    async fn register_face(&self, token: &str, image: &Snapshot) -> Result<MessageResponse, ApiError> {
        let form = Self::image_form(image)?;
        let response = self
            .http
            .post(self.url(REGISTER_FACE_PATH))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn check_face_auth(&self) -> Result<FaceAuthCapability, ApiError> {
        let response = self.http.post(self.url(CHECK_FACE_AUTH_PATH)).send().await?;
        decode(response).await
    }
}
