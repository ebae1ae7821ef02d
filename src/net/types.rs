//! Wire DTOs for the `/registration/*` API.
//!
//! DESIGN
//! ======
//! Error bodies follow a single contract: `{"detail": "<string>"}` with an
//! optional `email` on the 403 "email not verified" rejection. A `detail`
//! that is not a string (e.g. a validation-error array) is treated as absent
//! so callers fall back to their own generic message.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::{Deserialize, Deserializer, Serialize};

/// `detail` value the backend sends when sign-in is refused for an
/// unconfirmed account.
pub const EMAIL_NOT_VERIFIED_DETAIL: &str = "Email not verified";

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SigninCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConfirmSignupRequest {
    pub email: String,
    pub code: String,
}

/// One captured still frame, sent as the multipart `image` field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl Snapshot {
    pub const JPEG: &'static str = "image/jpeg";

    #[must_use]
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Self { bytes, mime: Self::JPEG.to_owned() }
    }

    /// File name reported in the multipart part, derived from the MIME type.
    #[must_use]
    pub fn file_name(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "capture.png",
            "image/webp" => "capture.webp",
            _ => "capture.jpg",
        }
    }
}

// =============================================================================
// RESPONSES
// =============================================================================

/// Token payload returned by `signin` and `signin_via_face`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AuthTokens {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Profile of the signed-in user from `GET /registration/me`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub email_verified: bool,
    /// Storage key of the registered face image; present once face auth is set up.
    #[serde(default)]
    pub face_image_key: Option<String>,
}

impl UserProfile {
    #[must_use]
    pub fn has_face_auth(&self) -> bool {
        self.face_image_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// `GET /registration/me` wraps the profile as `{"success": true, "data": {...}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProfileEnvelope {
    pub data: UserProfile,
}

/// Result of the cookie-based face-auth probe.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceAuthCapability {
    #[serde(default)]
    pub can_use_face_auth: bool,
    #[serde(default)]
    pub email: Option<String>,
}

/// Generic `{"message": "..."}` acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Decoded non-2xx response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default, deserialize_with = "string_detail")]
    pub detail: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl ErrorBody {
    /// Parse an error body, yielding an empty body for anything that is not
    /// a JSON object of the expected shape.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    #[must_use]
    pub fn is_email_not_verified(&self) -> bool {
        self.detail
            .as_deref()
            .is_some_and(|d| d.trim().eq_ignore_ascii_case(EMAIL_NOT_VERIFIED_DETAIL))
    }
}

fn string_detail<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid backend URL: {0}")]
    InvalidBaseUrl(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    #[error("http request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned status {status}")]
    Status { status: u16, body: ErrorBody },

    #[error("response decode failed: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("not signed in")]
    Unauthenticated,
}

impl ApiError {
    /// HTTP status for server rejections; `None` for local/transport failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-supplied `detail` string, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => body.detail.as_deref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            Self::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}
