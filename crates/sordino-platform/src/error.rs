//! Platform error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlatformError {
    /// The tab's audio stream could not be obtained: capture already held
    /// elsewhere, permission denied, or the tab closed mid-request.
    #[error("Capture unavailable: {reason}")]
    CaptureUnavailable { reason: String },

    #[error("Host call failed: {0}")]
    Host(String),
}
