//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const STATE_DIR: &str = ".faceauth";
const STATE_FILE: &str = "session.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {var}={value:?} ({reason})")]
    Parse { var: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub backend_url: String,
    pub state_file: PathBuf,
    pub connect_timeout: Duration,
    /// Whole-request timeout. Unset means requests may wait indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
            state_file: default_state_file(std::env::var_os("HOME").map(PathBuf::from)),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build typed client config from environment variables.
    ///
    /// Optional:
    /// - `FACEAUTH_BACKEND_URL`: default `http://127.0.0.1:8000`
    /// - `FACEAUTH_STATE_FILE`: default `$HOME/.faceauth/session.json`
    /// - `FACEAUTH_CONNECT_TIMEOUT_SECS`: default 10
    /// - `FACEAUTH_REQUEST_TIMEOUT_SECS`: unset by default
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when a timeout is not a whole number of seconds.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let backend_url = std::env::var("FACEAUTH_BACKEND_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map_or(defaults.backend_url, |v| normalize_base_url(&v));
        let state_file = std::env::var_os("FACEAUTH_STATE_FILE")
            .filter(|v| !v.is_empty())
            .map_or(defaults.state_file, PathBuf::from);
        let connect_timeout = env_secs("FACEAUTH_CONNECT_TIMEOUT_SECS")?.unwrap_or(defaults.connect_timeout);
        let request_timeout = env_secs("FACEAUTH_REQUEST_TIMEOUT_SECS")?;

        Ok(Self { backend_url, state_file, connect_timeout, request_timeout })
    }

    #[must_use]
    pub fn with_backend_url(mut self, url: &str) -> Self {
        self.backend_url = normalize_base_url(url);
        self
    }

    #[must_use]
    pub fn with_state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = path.into();
        self
    }
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn default_state_file(home: Option<PathBuf>) -> PathBuf {
    home.unwrap_or_else(|| PathBuf::from(".")).join(STATE_DIR).join(STATE_FILE)
}

fn env_secs(var: &'static str) -> Result<Option<Duration>, ConfigError> {
    let Ok(raw) = std::env::var(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|e| ConfigError::Parse { var, value: raw.clone(), reason: e.to_string() })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
