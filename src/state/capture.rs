//! Single-frame face capture flow.
//!
//! A capture takes exactly one still frame on demand from a [`FrameSource`];
//! nothing streams and nothing is buffered beyond the one frame. The flow
//! moves `Idle -> Captured -> Submitting -> Finished`, and a retake drops the
//! frame and re-arms the source.

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::net::types::Snapshot;

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to read frame from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("invalid base64 image payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("captured frame is empty")]
    Empty,
    #[error("unsupported image format (expected JPEG, PNG or WebP)")]
    UnsupportedImage,
    #[error("no frame has been captured")]
    NotCaptured,
    #[error("a capture is already being submitted")]
    Busy,
}

/// A camera-like device that yields one still frame per call.
pub trait FrameSource {
    /// # Errors
    ///
    /// Returns a [`CaptureError`] if no usable frame could be produced.
    fn capture(&mut self) -> Result<Snapshot, CaptureError>;
}

/// Reads a still image from disk. The file may hold raw image bytes or a
/// `data:image/...;base64,` screenshot.
#[derive(Clone, Debug)]
pub struct FileFrameSource {
    path: PathBuf,
}

impl FileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FrameSource for FileFrameSource {
    fn capture(&mut self) -> Result<Snapshot, CaptureError> {
        let bytes = std::fs::read(&self.path).map_err(|source| CaptureError::Io { path: self.path.clone(), source })?;
        let snapshot = match std::str::from_utf8(&bytes) {
            Ok(text) if text.trim_start().starts_with(DATA_URL_PREFIX) => snapshot_from_data_url(text)?,
            _ => snapshot_from_bytes(bytes)?,
        };
        tracing::debug!(path = %self.path.display(), bytes = snapshot.bytes.len(), mime = %snapshot.mime, "frame captured");
        Ok(snapshot)
    }
}

/// Convert a `data:image/<type>;base64,<payload>` screenshot into binary.
///
/// # Errors
///
/// Returns [`CaptureError::InvalidDataUrl`] for a malformed header or a
/// non-image MIME type, and [`CaptureError::Base64`] for a bad payload.
pub fn snapshot_from_data_url(data_url: &str) -> Result<Snapshot, CaptureError> {
    let rest = data_url
        .trim()
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| CaptureError::InvalidDataUrl("missing `data:` prefix".to_owned()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CaptureError::InvalidDataUrl("missing `,` separator".to_owned()))?;
    let mime = header
        .strip_suffix(BASE64_MARKER)
        .ok_or_else(|| CaptureError::InvalidDataUrl("payload is not base64".to_owned()))?;
    if !mime.starts_with("image/") {
        return Err(CaptureError::InvalidDataUrl(format!("not an image: {mime}")));
    }

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = BASE64.decode(compact)?;
    if bytes.is_empty() {
        return Err(CaptureError::Empty);
    }
    Ok(Snapshot { bytes, mime: mime.to_owned() })
}

/// Wrap raw image bytes, identifying the format from its signature.
///
/// # Errors
///
/// Returns [`CaptureError::Empty`] or [`CaptureError::UnsupportedImage`].
pub fn snapshot_from_bytes(bytes: Vec<u8>) -> Result<Snapshot, CaptureError> {
    if bytes.is_empty() {
        return Err(CaptureError::Empty);
    }
    let mime = sniff_mime(&bytes).ok_or(CaptureError::UnsupportedImage)?;
    Ok(Snapshot { bytes, mime: mime.to_owned() })
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(Snapshot::JPEG)
    } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

// =============================================================================
// FLOW
// =============================================================================

/// Result shown to the user once a submission completes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CapturePhase {
    /// Live view armed, nothing captured.
    #[default]
    Idle,
    Captured(Snapshot),
    Submitting,
    Finished(CaptureOutcome),
}

#[derive(Debug, Default)]
pub struct CaptureFlow {
    phase: CapturePhase,
}

impl CaptureFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> &CapturePhase {
        &self.phase
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.phase {
            CapturePhase::Captured(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Grab one frame from `source`, replacing any frame already held.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Busy`] while a submission is in flight, or the
    /// source's error. On a source error the flow is left unchanged.
    pub fn capture(&mut self, source: &mut dyn FrameSource) -> Result<&Snapshot, CaptureError> {
        if self.phase == CapturePhase::Submitting {
            return Err(CaptureError::Busy);
        }
        self.phase = CapturePhase::Captured(source.capture()?);
        self.snapshot().ok_or(CaptureError::NotCaptured)
    }

    /// Discard the captured frame (or the last result) and re-arm.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::Busy`] while a submission is in flight.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        if self.phase == CapturePhase::Submitting {
            return Err(CaptureError::Busy);
        }
        self.phase = CapturePhase::Idle;
        Ok(())
    }

    /// Hand the captured frame out for upload and enter `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotCaptured`] unless a frame is held, or
    /// [`CaptureError::Busy`] if a submission is already running.
    pub fn begin_submit(&mut self) -> Result<Snapshot, CaptureError> {
        match std::mem::replace(&mut self.phase, CapturePhase::Submitting) {
            CapturePhase::Captured(snapshot) => Ok(snapshot),
            CapturePhase::Submitting => Err(CaptureError::Busy),
            previous => {
                self.phase = previous;
                Err(CaptureError::NotCaptured)
            }
        }
    }

    /// Record the submission result.
    pub fn finish(&mut self, outcome: CaptureOutcome) {
        self.phase = CapturePhase::Finished(outcome);
    }

    #[must_use]
    pub fn outcome(&self) -> Option<&CaptureOutcome> {
        match &self.phase {
            CapturePhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }
}
