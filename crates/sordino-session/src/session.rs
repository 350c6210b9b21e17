//! Session data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sordino_platform::{CaptureStream, OutputNode, StreamId, TabId};

/// The audio-processing context for one tab: an exclusively owned
/// capture stream wired stream source → gain node → device output, plus
/// the mute/volume state that determines the gain.
///
/// Gain is a pure function of (muted, volume): 0.0 when muted, else
/// volume / 100. Every mutation pushes the recomputed gain to the
/// output node before returning, so fields stay private.
pub struct Session {
    /// Tab this session belongs to
    tab_id: TabId,
    /// Captured stream, released only on session destruction
    stream: Box<dyn CaptureStream>,
    /// Gain-controllable end of the audio graph
    output: Box<dyn OutputNode>,
    muted: bool,
    /// Volume percentage in [0, 100]
    volume: u8,
    /// When the session was created
    created_at: DateTime<Utc>,
}

impl Session {
    /// New sessions start unmuted at volume 0, so the tab stays silent
    /// until the user raises the volume.
    pub(crate) fn new(
        tab_id: TabId,
        stream: Box<dyn CaptureStream>,
        output: Box<dyn OutputNode>,
    ) -> Self {
        let session = Self {
            tab_id,
            stream,
            output,
            muted: false,
            volume: 0,
            created_at: Utc::now(),
        };
        session.apply_gain();
        session
    }

    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream.id()
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.volume) / 100.0
        }
    }

    fn apply_gain(&self) {
        self.output.set_gain(self.gain());
    }

    /// Flip the mute state. Returns the new state.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.apply_gain();
        self.muted
    }

    /// Raise the volume by `step`, saturating at 100. Returns the new
    /// volume.
    pub fn volume_up(&mut self, step: u8) -> u8 {
        self.volume = self.volume.saturating_add(step).min(100);
        self.apply_gain();
        self.volume
    }

    /// Lower the volume by `step`, saturating at 0. Returns the new
    /// volume.
    pub fn volume_down(&mut self, step: u8) -> u8 {
        self.volume = self.volume.saturating_sub(step);
        self.apply_gain();
        self.volume
    }

    /// Whether the backing stream is still delivering audio.
    pub fn is_active(&self) -> bool {
        self.stream.is_active()
    }

    /// Stop the stream and release the audio graph. Safe on an
    /// already-inactive stream.
    pub(crate) fn teardown(self) {
        self.stream.stop();
        self.output.release();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            tab_id: self.tab_id,
            muted: self.muted,
            volume: self.volume,
            gain: self.gain(),
            created_at: self.created_at,
        }
    }
}

/// Serializable view of a session for host UI layers. Carries no
/// stream or graph handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub tab_id: TabId,
    pub muted: bool,
    pub volume: u8,
    pub gain: f32,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use sordino_platform::fake::{FakeAudioGraph, FakeCaptureProvider};
    use sordino_platform::{AudioGraph, CaptureProvider};

    async fn make_session(graph: &FakeAudioGraph) -> Session {
        let provider = FakeCaptureProvider::new();
        let stream = provider.request_capture(TabId(1)).await.unwrap();
        let output = graph.build(stream.as_ref()).unwrap();
        Session::new(TabId(1), stream, output)
    }

    #[tokio::test]
    async fn test_new_session_defaults() {
        let graph = FakeAudioGraph::new();
        let session = make_session(&graph).await;

        assert!(!session.muted());
        assert_eq!(session.volume(), 0);
        assert_eq!(session.gain(), 0.0);
        assert_eq!(graph.last_node().unwrap().gain(), 0.0);
    }

    #[tokio::test]
    async fn test_gain_follows_mute_and_volume() {
        let graph = FakeAudioGraph::new();
        let mut session = make_session(&graph).await;
        let node = graph.last_node().unwrap();

        session.volume_up(5);
        assert_eq!(session.gain(), 0.05);
        assert_eq!(node.gain(), 0.05);

        session.toggle_mute();
        assert_eq!(session.gain(), 0.0);
        assert_eq!(node.gain(), 0.0);

        session.toggle_mute();
        assert_eq!(session.gain(), 0.05);
        assert_eq!(node.gain(), 0.05);
    }

    #[tokio::test]
    async fn test_volume_saturates_at_100() {
        let graph = FakeAudioGraph::new();
        let mut session = make_session(&graph).await;

        for _ in 0..25 {
            session.volume_up(5);
        }
        assert_eq!(session.volume(), 100);
        assert_eq!(session.gain(), 1.0);
    }

    #[tokio::test]
    async fn test_volume_saturates_at_0() {
        let graph = FakeAudioGraph::new();
        let mut session = make_session(&graph).await;

        session.volume_up(5);
        for _ in 0..5 {
            session.volume_down(5);
        }
        assert_eq!(session.volume(), 0);
        assert_eq!(session.gain(), 0.0);
    }

    #[tokio::test]
    async fn test_mute_toggle_twice_restores_state() {
        let graph = FakeAudioGraph::new();
        let mut session = make_session(&graph).await;
        session.volume_up(40);

        let before = (session.muted(), session.gain());
        session.toggle_mute();
        session.toggle_mute();
        assert_eq!((session.muted(), session.gain()), before);
    }

    #[tokio::test]
    async fn test_teardown_stops_stream_and_releases_graph() {
        let provider = FakeCaptureProvider::new();
        let graph = FakeAudioGraph::new();
        let stream = provider.request_capture(TabId(7)).await.unwrap();
        let output = graph.build(stream.as_ref()).unwrap();

        Session::new(TabId(7), stream, output).teardown();

        assert!(provider.streams()[0].is_stopped());
        assert!(graph.last_node().unwrap().is_released());
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip() {
        let graph = FakeAudioGraph::new();
        let mut session = make_session(&graph).await;
        session.volume_up(15);

        let snapshot = session.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(back.tab_id, TabId(1));
        assert_eq!(back.volume, 15);
        assert_eq!(back.gain, 0.15);
        assert!(!back.muted);
    }
}
