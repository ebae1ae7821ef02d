//! Scripted [`AuthApi`] double shared by session and page tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::net::api::AuthApi;
use crate::net::types::{
    ApiError, AuthTokens, ConfirmSignupRequest, ErrorBody, FaceAuthCapability, MessageResponse, SigninCredentials,
    SignupRequest, Snapshot, UserProfile,
};

/// Scripted reply for one endpoint.
#[derive(Clone, Debug)]
pub enum Reply {
    /// 2xx carrying the given token (sign-in) or message (everything else).
    Ok(&'static str),
    /// 2xx with `success: true` but no token/message.
    OkEmpty,
    /// 2xx with `success: false`.
    NotSuccess,
    /// Non-2xx with the given raw JSON body.
    Status(u16, &'static str),
    /// The response could not be decoded.
    Broken,
}

fn broken() -> ApiError {
    ApiError::Decode(serde_json::from_str::<serde_json::Value>("{").unwrap_err())
}

impl Reply {
    fn tokens(&self) -> Result<AuthTokens, ApiError> {
        match self {
            Reply::Ok(token) => Ok(AuthTokens {
                success: Some(true),
                access_token: Some((*token).to_owned()),
                ..AuthTokens::default()
            }),
            Reply::OkEmpty => Ok(AuthTokens { success: Some(true), ..AuthTokens::default() }),
            Reply::NotSuccess => Ok(AuthTokens {
                success: Some(false),
                access_token: Some("ignored".to_owned()),
                ..AuthTokens::default()
            }),
            Reply::Status(status, raw) => Err(ApiError::Status { status: *status, body: ErrorBody::parse(raw) }),
            Reply::Broken => Err(broken()),
        }
    }

    fn message(&self) -> Result<MessageResponse, ApiError> {
        match self {
            Reply::Ok(message) => Ok(MessageResponse { message: Some((*message).to_owned()) }),
            Reply::OkEmpty | Reply::NotSuccess => Ok(MessageResponse::default()),
            Reply::Status(status, raw) => Err(ApiError::Status { status: *status, body: ErrorBody::parse(raw) }),
            Reply::Broken => Err(broken()),
        }
    }
}

/// Profile the mock returns for `token`.
pub fn profile_for(token: &str) -> UserProfile {
    UserProfile {
        username: format!("user-{token}"),
        email: "a@b.com".to_owned(),
        email_verified: true,
        face_image_key: None,
    }
}

pub struct MockApi {
    signin: Mutex<Reply>,
    signin_via_face: Mutex<Reply>,
    signup: Mutex<Reply>,
    confirm: Mutex<Reply>,
    register: Mutex<Reply>,
    profile_status: Mutex<Option<u16>>,
    profile_face_key: Mutex<Option<String>>,
    profile_gates: Mutex<HashMap<String, Arc<Notify>>>,
    capability: Mutex<Option<FaceAuthCapability>>,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            signin: Mutex::new(Reply::Ok("tok")),
            signin_via_face: Mutex::new(Reply::Ok("face-tok")),
            signup: Mutex::new(Reply::Ok("User registered successfully")),
            confirm: Mutex::new(Reply::Ok("User confirmed successfully")),
            register: Mutex::new(Reply::Ok("Face registered successfully")),
            profile_status: Mutex::new(None),
            profile_face_key: Mutex::new(None),
            profile_gates: Mutex::new(HashMap::new()),
            capability: Mutex::new(Some(FaceAuthCapability::default())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_signin(self, reply: Reply) -> Self {
        *self.signin.lock().unwrap() = reply;
        self
    }

    pub fn with_signin_via_face(self, reply: Reply) -> Self {
        *self.signin_via_face.lock().unwrap() = reply;
        self
    }

    pub fn with_signup(self, reply: Reply) -> Self {
        *self.signup.lock().unwrap() = reply;
        self
    }

    pub fn with_confirm(self, reply: Reply) -> Self {
        *self.confirm.lock().unwrap() = reply;
        self
    }

    pub fn with_register(self, reply: Reply) -> Self {
        *self.register.lock().unwrap() = reply;
        self
    }

    /// Make `GET /me` fail with `status` (or succeed again with `None`).
    pub fn set_profile_status(&self, status: Option<u16>) {
        *self.profile_status.lock().unwrap() = status;
    }

    pub fn with_profile_face_key(self, key: &str) -> Self {
        *self.profile_face_key.lock().unwrap() = Some(key.to_owned());
        self
    }

    /// `None` makes the capability probe fail.
    pub fn with_capability(self, capability: Option<FaceAuthCapability>) -> Self {
        *self.capability.lock().unwrap() = capability;
        self
    }

    /// Hold profile fetches for `token` until the returned handle is notified.
    pub fn gate_profile(&self, token: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.profile_gates.lock().unwrap().insert(token.to_owned(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Tokens passed to `fetch_profile`, in call order.
    pub fn profile_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| c.strip_prefix("profile:").map(str::to_owned))
            .collect()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl AuthApi for MockApi {
    async fn signin(&self, credentials: &SigninCredentials) -> Result<AuthTokens, ApiError> {
        self.record(format!("signin:{}", credentials.email));
        self.signin.lock().unwrap().tokens()
    }

    async fn signin_via_face(&self, image: &Snapshot) -> Result<AuthTokens, ApiError> {
        self.record(format!("signin_via_face:{}", image.bytes.len()));
        self.signin_via_face.lock().unwrap().tokens()
    }

    async fn signup(&self, request: &SignupRequest) -> Result<MessageResponse, ApiError> {
        self.record(format!("signup:{}:{}", request.email, request.username));
        self.signup.lock().unwrap().message()
    }

    async fn confirm_signup(&self, request: &ConfirmSignupRequest) -> Result<MessageResponse, ApiError> {
        self.record(format!("confirm:{}:{}", request.email, request.code));
        self.confirm.lock().unwrap().message()
    }

    async fn fetch_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
        self.record(format!("profile:{token}"));
        let gate = self.profile_gates.lock().unwrap().get(token).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(status) = *self.profile_status.lock().unwrap() {
            return Err(ApiError::Status { status, body: ErrorBody::default() });
        }
        let mut profile = profile_for(token);
        profile.face_image_key.clone_from(&self.profile_face_key.lock().unwrap());
        Ok(profile)
    }

    async fn register_face(&self, token: &str, image: &Snapshot) -> Result<MessageResponse, ApiError> {
        self.record(format!("register:{token}:{}", image.bytes.len()));
        self.register.lock().unwrap().message()
    }

    async fn check_face_auth(&self) -> Result<FaceAuthCapability, ApiError> {
        self.record("check_face_auth".to_owned());
        self.capability
            .lock()
            .unwrap()
            .clone()
            .ok_or(ApiError::Status { status: 500, body: ErrorBody::default() })
    }
}
