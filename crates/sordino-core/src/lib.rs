//! SORDINO Core
//!
//! Per-tab volume control for a browser host: mute, raise, lower, and
//! reset the audio of the active tab, with per-tab icon and badge
//! feedback. This crate wires the session manager and command
//! dispatcher to a concrete host platform and absorbs every
//! recoverable error so the host stays responsive.

mod config;
mod controller;
mod error;

pub use config::Config;
pub use controller::Controller;
pub use error::CoreError;

// Re-export core components
pub use sordino_dispatch::{Command, CommandDispatcher, DispatchError};
pub use sordino_platform::fake;
pub use sordino_platform::{
    AudioGraph, CaptureProvider, CaptureStream, IconVariant, OutputNode, PlatformError,
    PresentationSink, StreamId, TabHost, TabId,
};
pub use sordino_session::{
    EnsureOutcome, Session, SessionError, SessionManager, SessionSnapshot, SessionStore,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
