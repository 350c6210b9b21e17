//! SORDINO Session Management
//!
//! A Session is the managed audio-processing context for one tab: the
//! exclusively owned capture stream, the gain graph over it, and the
//! mute/volume state that drives the graph's gain.
//!
//! - At most one session exists per tab; creation is guarded against
//!   concurrent duplicate capture requests
//! - Gain is always a pure function of (muted, volume)
//! - Sessions whose backing stream has gone inactive are reclaimed by
//!   the sweep
//! - Sessions live in memory only, never beyond the process

mod error;
mod manager;
mod session;
mod store;

pub use error::SessionError;
pub use manager::{EnsureOutcome, SessionManager};
pub use session::{Session, SessionSnapshot};
pub use store::SessionStore;

pub type Result<T> = std::result::Result<T, SessionError>;
