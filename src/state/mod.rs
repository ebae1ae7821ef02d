//! Client-side state.
//!
//! DESIGN
//! ======
//! `session` owns identity (token + profile); `capture` owns the single
//! frame being prepared for a face upload. Pages hold one of each as needed.

pub mod capture;
pub mod session;

pub use capture::{CaptureFlow, FileFrameSource, FrameSource};
pub use session::{LoginResult, SessionSnapshot, SessionState};
