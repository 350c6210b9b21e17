//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Session error: {0}")]
    Session(#[from] sordino_session::SessionError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] sordino_dispatch::DispatchError),

    #[error("Platform error: {0}")]
    Platform(#[from] sordino_platform::PlatformError),
}
