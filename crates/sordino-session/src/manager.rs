//! Session lifecycle manager
//!
//! Creates sessions through the capture provider and audio graph,
//! destroys them, and sweeps sessions whose backing stream has gone
//! inactive behind the store's back.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use uuid::Uuid;

use sordino_platform::{AudioGraph, CaptureProvider, PlatformError, TabId};

use crate::error::SessionError;
use crate::session::{Session, SessionSnapshot};
use crate::store::{BeginCreation, Removed, SessionStore, SlotView};
use crate::Result;

/// Whether an ensure call created the session or found one in place.
/// The dispatcher clears the platform mute flag exactly once, on
/// `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    Created,
    Existing,
}

#[derive(Clone)]
pub struct SessionManager {
    store: SessionStore,
    provider: Arc<dyn CaptureProvider>,
    graph: Arc<dyn AudioGraph>,
    /// Delay before a sweep scans, so a stream mid-teardown is not
    /// observed as falsely active.
    settle_delay: Duration,
}

impl SessionManager {
    pub fn new(
        provider: Arc<dyn CaptureProvider>,
        graph: Arc<dyn AudioGraph>,
        settle_delay: Duration,
    ) -> Self {
        Self {
            store: SessionStore::new(),
            provider,
            graph,
            settle_delay,
        }
    }

    /// Guarantee a session exists for `tab`, creating one if needed.
    ///
    /// Concurrent calls for the same tab issue a single capture
    /// request: the first installs an in-flight marker and performs the
    /// capture, later callers await its settle signal and re-inspect
    /// the store. If the owning attempt fails, the waiters fail with
    /// `CaptureUnavailable` as well.
    pub async fn ensure_session(&self, tab: TabId) -> Result<EnsureOutcome> {
        match self.store.begin_creation(tab) {
            BeginCreation::AlreadyActive => Ok(EnsureOutcome::Existing),
            BeginCreation::Installed { ticket, settle } => {
                self.create_session(tab, ticket, settle).await
            }
            BeginCreation::InFlight(settled) => self.await_creation(tab, settled).await,
        }
    }

    async fn create_session(
        &self,
        tab: TabId,
        ticket: Uuid,
        settle: watch::Sender<bool>,
    ) -> Result<EnsureOutcome> {
        // The capture await is a drop point: the host may wrap this
        // call in a timeout or select. If the future is dropped there,
        // the guard clears our marker so the tab is not wedged.
        let mut guard = CreationGuard {
            store: &self.store,
            tab,
            ticket,
            armed: true,
        };

        let outcome = match self.try_create(tab).await {
            Ok(session) => match self.store.complete_creation(tab, ticket, session) {
                Ok(()) => {
                    tracing::info!(tab = %tab, "Created audio session");
                    Ok(EnsureOutcome::Created)
                }
                Err(session) => {
                    // Destroyed while the capture was in flight.
                    tracing::debug!(tab = %tab, "Session creation cancelled, discarding stream");
                    session.teardown();
                    Err(SessionError::Cancelled(tab))
                }
            },
            Err(e) => {
                self.store.abort_creation(tab, ticket);
                Err(e)
            }
        };

        guard.armed = false;
        let _ = settle.send(true);
        outcome
    }

    async fn try_create(&self, tab: TabId) -> Result<Session> {
        let stream = self
            .provider
            .request_capture(tab)
            .await
            .map_err(|e| match e {
                PlatformError::CaptureUnavailable { reason } => {
                    SessionError::CaptureUnavailable { reason }
                }
                other => SessionError::Platform(other),
            })?;

        let output = match self.graph.build(stream.as_ref()) {
            Ok(output) => output,
            Err(e) => {
                stream.stop();
                return Err(SessionError::Platform(e));
            }
        };

        Ok(Session::new(tab, stream, output))
    }

    async fn await_creation(
        &self,
        tab: TabId,
        mut settled: watch::Receiver<bool>,
    ) -> Result<EnsureOutcome> {
        loop {
            tracing::debug!(tab = %tab, "Awaiting in-flight session creation");
            if settled.wait_for(|done| *done).await.is_err() {
                // The creating task was dropped without settling.
                // Clear its stale marker so we cannot re-subscribe to
                // the same dead channel below.
                self.store.clear_dead_creation(tab);
            }

            match self.store.slot_view(tab) {
                SlotView::Active => return Ok(EnsureOutcome::Existing),
                SlotView::Creating(next) => settled = next,
                SlotView::Absent => {
                    return Err(SessionError::CaptureUnavailable {
                        reason: "concurrent capture attempt failed".to_string(),
                    })
                }
            }
        }
    }

    /// Destroy the session for `tab`: stop the stream, release the
    /// graph, remove the store entry. No-op if the tab has no session.
    /// A creation in flight for `tab` is marked cancelled instead; the
    /// creating task discards its stream when the capture resolves.
    pub fn destroy_session(&self, tab: TabId) {
        match self.store.remove(tab) {
            Removed::Session(session) => {
                session.teardown();
                tracing::info!(tab = %tab, "Destroyed audio session");
            }
            Removed::CreationCancelled => {
                tracing::debug!(tab = %tab, "Cancelled in-flight session creation");
            }
            Removed::Absent => {}
        }
    }

    /// Destroy every session whose backing stream has gone inactive.
    /// Waits the settle delay before scanning. Returns the number of
    /// sessions reclaimed.
    pub async fn sweep_inactive(&self) -> usize {
        tokio::time::sleep(self.settle_delay).await;

        let drained = self.store.drain_inactive();
        let count = drained.len();
        for session in drained {
            let tab = session.tab_id();
            session.teardown();
            tracing::info!(tab = %tab, "Reclaimed inactive session");
        }
        count
    }

    /// Run `f` against the stored session for `tab`.
    pub fn with_session<T>(
        &self,
        tab: TabId,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Result<T> {
        self.store
            .with_active(tab, f)
            .ok_or(SessionError::NotFound(tab))
    }

    pub fn has_session(&self, tab: TabId) -> bool {
        self.store.contains(tab)
    }

    pub fn session_count(&self) -> usize {
        self.store.active_count()
    }

    pub fn snapshot(&self, tab: TabId) -> Option<SessionSnapshot> {
        self.store.snapshot(tab)
    }

    pub fn volume_of(&self, tab: TabId) -> Option<u8> {
        self.store.snapshot(tab).map(|s| s.volume)
    }
}

/// Clears a tab's in-flight creation marker unless the creation
/// settled first. Keeps an abandoned `ensure_session` future (dropped
/// at the capture await) from leaving the slot permanently `Creating`.
struct CreationGuard<'a> {
    store: &'a SessionStore,
    tab: TabId,
    ticket: Uuid,
    armed: bool,
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.store.abort_creation(self.tab, self.ticket);
            tracing::debug!(tab = %self.tab, "Cleared abandoned session creation");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sordino_platform::fake::{FakeAudioGraph, FakeCaptureProvider};

    fn make_manager() -> (Arc<FakeCaptureProvider>, Arc<FakeAudioGraph>, SessionManager) {
        let provider = Arc::new(FakeCaptureProvider::new());
        let graph = Arc::new(FakeAudioGraph::new());
        let manager = SessionManager::new(
            Arc::clone(&provider) as Arc<dyn CaptureProvider>,
            Arc::clone(&graph) as Arc<dyn AudioGraph>,
            Duration::from_millis(1),
        );
        (provider, graph, manager)
    }

    #[tokio::test]
    async fn test_ensure_creates_then_finds_existing() {
        let (provider, _, manager) = make_manager();
        let tab = TabId(1);

        assert_eq!(manager.ensure_session(tab).await.unwrap(), EnsureOutcome::Created);
        assert_eq!(manager.ensure_session(tab).await.unwrap(), EnsureOutcome::Existing);
        assert_eq!(provider.request_count(), 1);
        assert_eq!(manager.session_count(), 1);
    }

    #[tokio::test]
    async fn test_capture_failure_stores_nothing() {
        let (provider, _, manager) = make_manager();
        provider.set_fail(true);

        let err = manager.ensure_session(TabId(1)).await.unwrap_err();
        assert!(matches!(err, SessionError::CaptureUnavailable { .. }));
        assert_eq!(manager.session_count(), 0);

        // The failed marker is gone; a later attempt can succeed.
        provider.set_fail(false);
        assert_eq!(
            manager.ensure_session(TabId(1)).await.unwrap(),
            EnsureOutcome::Created
        );
    }

    #[tokio::test]
    async fn test_graph_failure_stops_stream() {
        let (provider, graph, manager) = make_manager();
        graph.set_fail(true);

        let err = manager.ensure_session(TabId(1)).await.unwrap_err();
        assert!(matches!(err, SessionError::Platform(_)));
        assert!(provider.streams()[0].is_stopped());
        assert_eq!(manager.session_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_ensure_issues_one_capture() {
        let (provider, _, manager) = make_manager();
        provider.set_delay(Duration::from_millis(10));
        let tab = TabId(1);

        let (a, b) = tokio::join!(manager.ensure_session(tab), manager.ensure_session(tab));

        assert_eq!(provider.request_count(), 1);
        assert_eq!(manager.session_count(), 1);
        let outcomes = [a.unwrap(), b.unwrap()];
        assert!(outcomes.contains(&EnsureOutcome::Created));
        assert!(outcomes.contains(&EnsureOutcome::Existing));
    }

    #[tokio::test]
    async fn test_concurrent_ensure_shares_failure() {
        let (provider, _, manager) = make_manager();
        provider.set_delay(Duration::from_millis(10));
        provider.set_fail(true);
        let tab = TabId(1);

        let (a, b) = tokio::join!(manager.ensure_session(tab), manager.ensure_session(tab));

        assert_eq!(provider.request_count(), 1);
        assert!(matches!(a.unwrap_err(), SessionError::CaptureUnavailable { .. }));
        assert!(matches!(b.unwrap_err(), SessionError::CaptureUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_dropped_creation_does_not_wedge_tab() {
        let (provider, _, manager) = make_manager();
        provider.set_delay(Duration::from_millis(50));
        let tab = TabId(1);

        // A host-side timeout drops the creating future mid-capture.
        let aborted =
            tokio::time::timeout(Duration::from_millis(5), manager.ensure_session(tab)).await;
        assert!(aborted.is_err());

        // The tab must still be able to get a session afterwards.
        provider.set_delay(Duration::from_millis(1));
        let outcome =
            tokio::time::timeout(Duration::from_millis(200), manager.ensure_session(tab))
                .await
                .expect("retry must not hang")
                .unwrap();
        assert_eq!(outcome, EnsureOutcome::Created);
        assert!(manager.has_session(tab));
    }

    #[tokio::test]
    async fn test_stale_creation_marker_fails_once_then_recovers() {
        let (_, _, manager) = make_manager();
        let tab = TabId(2);

        // A marker whose creating task vanished without settling.
        if let BeginCreation::Installed { settle, .. } = manager.store.begin_creation(tab) {
            drop(settle);
        }

        let err = tokio::time::timeout(Duration::from_millis(200), manager.ensure_session(tab))
            .await
            .expect("waiter must not hang")
            .unwrap_err();
        assert!(matches!(err, SessionError::CaptureUnavailable { .. }));

        assert_eq!(
            manager.ensure_session(tab).await.unwrap(),
            EnsureOutcome::Created
        );
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let (provider, graph, manager) = make_manager();
        let tab = TabId(1);

        manager.ensure_session(tab).await.unwrap();
        manager.destroy_session(tab);
        assert!(!manager.has_session(tab));
        assert!(provider.streams()[0].is_stopped());
        assert!(graph.last_node().unwrap().is_released());

        // Second destroy is a no-op.
        manager.destroy_session(tab);
        assert_eq!(manager.session_count(), 0);
    }

    #[tokio::test]
    async fn test_destroy_cancels_in_flight_creation() {
        let (provider, _, manager) = make_manager();
        provider.set_delay(Duration::from_millis(10));
        let tab = TabId(1);

        let (result, _) = tokio::join!(manager.ensure_session(tab), async {
            tokio::time::sleep(Duration::from_millis(2)).await;
            manager.destroy_session(tab);
        });

        assert!(matches!(result.unwrap_err(), SessionError::Cancelled(_)));
        assert!(!manager.has_session(tab));
        // The late-finishing capture was stopped, never stored.
        assert!(provider.streams()[0].is_stopped());
    }

    #[tokio::test]
    async fn test_sweep_reclaims_inactive_sessions() {
        let (provider, graph, manager) = make_manager();
        manager.ensure_session(TabId(1)).await.unwrap();
        manager.ensure_session(TabId(2)).await.unwrap();

        provider.streams()[0].set_active(false);
        assert_eq!(manager.sweep_inactive().await, 1);

        assert!(!manager.has_session(TabId(1)));
        assert!(manager.has_session(TabId(2)));
        assert!(graph.nodes()[0].is_released());
        assert!(!graph.nodes()[1].is_released());
    }

    #[tokio::test]
    async fn test_with_session_not_found() {
        let (_, _, manager) = make_manager();
        let err = manager.with_session(TabId(5), |s| s.volume()).unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }
}
