//! SORDINO Command Dispatch
//!
//! Turns discrete user intents (mute toggle, volume up/down, reset)
//! into session state transitions and presentation side effects, and
//! handles the host's tab lifecycle events.

mod command;
mod dispatcher;
mod error;

pub use command::Command;
pub use dispatcher::CommandDispatcher;
pub use error::DispatchError;

pub type Result<T> = std::result::Result<T, DispatchError>;
