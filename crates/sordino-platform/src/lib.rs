//! SORDINO Platform Seams
//!
//! The traits the audio core consumes from its host browser:
//! - Capturing a tab's audio output as an exclusive stream
//! - Building a gain-controllable audio graph over a captured stream
//! - Querying and mutating tab state (active tab, platform mute flag)
//! - Rendering per-tab presentation (toolbar icon, volume badge)
//!
//! None of these are implemented by the core; a host shell provides
//! concrete implementations. `fake` holds in-memory doubles for tests.

pub mod fake;

mod error;
mod ids;
mod traits;

pub use error::PlatformError;
pub use ids::{StreamId, TabId};
pub use traits::{
    AudioGraph, CaptureProvider, CaptureStream, IconVariant, OutputNode, PresentationSink, TabHost,
};

pub type Result<T> = std::result::Result<T, PlatformError>;
