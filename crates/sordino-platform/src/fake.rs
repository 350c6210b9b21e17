//! In-memory fakes for the host seams
//!
//! Shared by the unit and integration tests of every downstream crate.
//! Each fake records the calls made against it so tests can assert on
//! side effects (gain pushed, badge text, mute flag) without a browser.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ids::{StreamId, TabId};
use crate::traits::{
    AudioGraph, CaptureProvider, CaptureStream, IconVariant, OutputNode, PresentationSink, TabHost,
};
use crate::{PlatformError, Result};

/// Observable state of a fake capture stream, shared with the test.
#[derive(Default)]
pub struct FakeStreamState {
    active: AtomicBool,
    stopped: AtomicBool,
}

impl FakeStreamState {
    fn live() -> Arc<Self> {
        let state = Self::default();
        state.active.store(true, Ordering::SeqCst);
        Arc::new(state)
    }

    /// Flip the stream's active flag, simulating an asynchronous loss of
    /// the underlying capture (navigation, revoked permission).
    pub fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

pub struct FakeStream {
    id: StreamId,
    state: Arc<FakeStreamState>,
}

impl CaptureStream for FakeStream {
    fn id(&self) -> StreamId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
        self.state.active.store(false, Ordering::SeqCst);
    }
}

/// Capture provider double. Counts requests, optionally delays or fails
/// them, and hands out handles to every stream it has created so tests
/// can poke at stream state after the core has taken ownership.
#[derive(Default)]
pub struct FakeCaptureProvider {
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    requests: AtomicUsize,
    streams: Mutex<Vec<Arc<FakeStreamState>>>,
}

impl FakeCaptureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent capture requests fail with `CaptureUnavailable`.
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delay subsequent capture requests, holding them at the suspension
    /// point so tests can overlap concurrent commands.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn streams(&self) -> Vec<Arc<FakeStreamState>> {
        self.streams.lock().clone()
    }
}

#[async_trait]
impl CaptureProvider for FakeCaptureProvider {
    async fn request_capture(&self, _tab: TabId) -> Result<Box<dyn CaptureStream>> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::CaptureUnavailable {
                reason: "capture already held elsewhere".to_string(),
            });
        }

        let state = FakeStreamState::live();
        self.streams.lock().push(Arc::clone(&state));

        Ok(Box::new(FakeStream {
            id: StreamId::new(),
            state,
        }))
    }
}

/// Observable state of a fake output node.
#[derive(Default)]
pub struct FakeNodeState {
    gain: Mutex<f32>,
    released: AtomicBool,
}

impl FakeNodeState {
    pub fn gain(&self) -> f32 {
        *self.gain.lock()
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

pub struct FakeOutputNode {
    state: Arc<FakeNodeState>,
}

impl OutputNode for FakeOutputNode {
    fn set_gain(&self, gain: f32) {
        *self.state.gain.lock() = gain;
    }

    fn release(&self) {
        self.state.released.store(true, Ordering::SeqCst);
    }
}

/// Audio graph double. Hands out handles to every node it has built.
#[derive(Default)]
pub struct FakeAudioGraph {
    fail: AtomicBool,
    nodes: Mutex<Vec<Arc<FakeNodeState>>>,
}

impl FakeAudioGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn nodes(&self) -> Vec<Arc<FakeNodeState>> {
        self.nodes.lock().clone()
    }

    /// The most recently built node, for single-session tests.
    pub fn last_node(&self) -> Option<Arc<FakeNodeState>> {
        self.nodes.lock().last().cloned()
    }
}

impl AudioGraph for FakeAudioGraph {
    fn build(&self, _stream: &dyn CaptureStream) -> Result<Box<dyn OutputNode>> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::Host("graph construction failed".to_string()));
        }

        let state = Arc::new(FakeNodeState::default());
        self.nodes.lock().push(Arc::clone(&state));

        Ok(Box::new(FakeOutputNode { state }))
    }
}

/// Tab host double: a settable active tab plus a record of every
/// mute-flag mutation.
#[derive(Default)]
pub struct FakeHost {
    active: Mutex<Option<TabId>>,
    muted: Mutex<HashMap<TabId, bool>>,
    mute_calls: AtomicUsize,
    fail: AtomicBool,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_active_tab(&self, tab: Option<TabId>) {
        *self.active.lock() = tab;
    }

    /// The last mute flag applied to `tab`, if any call was made.
    pub fn muted_flag(&self, tab: TabId) -> Option<bool> {
        self.muted.lock().get(&tab).copied()
    }

    pub fn mute_call_count(&self) -> usize {
        self.mute_calls.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TabHost for FakeHost {
    async fn active_tab(&self) -> Option<TabId> {
        *self.active.lock()
    }

    async fn set_tab_muted(&self, tab: TabId, muted: bool) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::Host("tab gone".to_string()));
        }
        self.mute_calls.fetch_add(1, Ordering::SeqCst);
        self.muted.lock().insert(tab, muted);
        Ok(())
    }
}

/// Presentation sink double: records the icon and badge text per tab.
#[derive(Default)]
pub struct FakeSink {
    icons: Mutex<HashMap<TabId, IconVariant>>,
    badges: Mutex<HashMap<TabId, String>>,
    fail: AtomicBool,
}

impl FakeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn icon(&self, tab: TabId) -> Option<IconVariant> {
        self.icons.lock().get(&tab).copied()
    }

    pub fn badge(&self, tab: TabId) -> Option<String> {
        self.badges.lock().get(&tab).cloned()
    }

    pub fn update_count(&self) -> usize {
        self.icons.lock().len() + self.badges.lock().len()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PresentationSink for FakeSink {
    async fn set_icon(&self, tab: TabId, variant: IconVariant) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::Host("tab gone".to_string()));
        }
        self.icons.lock().insert(tab, variant);
        Ok(())
    }

    async fn set_badge_text(&self, tab: TabId, text: &str) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PlatformError::Host("tab gone".to_string()));
        }
        self.badges.lock().insert(tab, text.to_string());
        Ok(())
    }
}
