//! Dispatch error types

use sordino_session::SessionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    /// No tab is focused; the command has nothing to act on.
    #[error("No active tab")]
    NoActiveTab,

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}
