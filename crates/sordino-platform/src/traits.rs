//! Host capability traits
//!
//! The contracts a host shell must implement for the core to run.
//! Async traits cover calls that suspend (capture requests, tab queries,
//! presentation updates); the audio graph itself is controlled
//! synchronously once built.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ids::{StreamId, TabId};
use crate::Result;

/// Yields an exclusive capture stream for a tab's audio output.
#[async_trait]
pub trait CaptureProvider: Send + Sync {
    /// Request exclusive capture of `tab`'s audio output.
    ///
    /// Fails with [`crate::PlatformError::CaptureUnavailable`] when the
    /// stream cannot be obtained (capture already held elsewhere,
    /// permission denied, tab closed mid-request).
    async fn request_capture(&self, tab: TabId) -> Result<Box<dyn CaptureStream>>;
}

/// An exclusively owned, captured audio stream.
pub trait CaptureStream: Send + Sync {
    fn id(&self) -> StreamId;

    /// Whether the stream is still delivering audio. Streams can go
    /// inactive asynchronously (tab navigation, revoked permission)
    /// without any removal event.
    fn is_active(&self) -> bool;

    /// Stop every track of the stream. Must be safe to call repeatedly
    /// or on an already-inactive stream.
    fn stop(&self);
}

/// Builds the audio graph over a captured stream: stream source → gain
/// node → device output.
pub trait AudioGraph: Send + Sync {
    fn build(&self, stream: &dyn CaptureStream) -> Result<Box<dyn OutputNode>>;
}

/// The gain-controllable output end of a built audio graph.
pub trait OutputNode: Send + Sync {
    /// Set the linear gain multiplier (0.0 = silent, 1.0 = unity).
    fn set_gain(&self, gain: f32);

    /// Tear the graph down. Must be idempotent.
    fn release(&self);
}

/// Tab-level queries and mutations.
#[async_trait]
pub trait TabHost: Send + Sync {
    /// The currently focused tab, if any.
    async fn active_tab(&self) -> Option<TabId>;

    /// Set the platform-level mute flag on a tab.
    async fn set_tab_muted(&self, tab: TabId, muted: bool) -> Result<()>;
}

/// Toolbar icon variants the host can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconVariant {
    Default,
    Muted,
}

/// Per-tab visual feedback: toolbar icon and volume badge.
#[async_trait]
pub trait PresentationSink: Send + Sync {
    async fn set_icon(&self, tab: TabId, variant: IconVariant) -> Result<()>;

    /// Set the badge text shown on the toolbar icon for `tab`. An empty
    /// string clears the badge.
    async fn set_badge_text(&self, tab: TabId, text: &str) -> Result<()>;
}
