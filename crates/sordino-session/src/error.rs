//! Session error types

use sordino_platform::{PlatformError, TabId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// The tab's audio stream could not be obtained. Recovered locally:
    /// the triggering command aborts with no state change.
    #[error("Capture unavailable: {reason}")]
    CaptureUnavailable { reason: String },

    /// Session creation was cancelled by a destruction request that
    /// arrived while the capture was in flight.
    #[error("Session creation cancelled for tab {0}")]
    Cancelled(TabId),

    /// The session vanished between ensure and apply; only reachable
    /// when a tab removal races a command.
    #[error("No session for tab {0}")]
    NotFound(TabId),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),
}
