//! Controller facade
//!
//! The host-facing surface: one object the host shell feeds raw
//! command strings and tab events into. Recoverable errors (no active
//! tab, capture unavailable, creation cancelled) are logged and
//! swallowed here; the host never sees them.

use std::sync::Arc;
use std::time::Duration;

use sordino_dispatch::{Command, CommandDispatcher, DispatchError};
use sordino_platform::{AudioGraph, CaptureProvider, PresentationSink, TabHost, TabId};
use sordino_session::{SessionError, SessionManager, SessionSnapshot};

use crate::config::Config;
use crate::Result;

pub struct Controller {
    dispatcher: CommandDispatcher,
    config: Config,
}

impl Controller {
    pub fn new(
        config: Config,
        provider: Arc<dyn CaptureProvider>,
        graph: Arc<dyn AudioGraph>,
        host: Arc<dyn TabHost>,
        sink: Arc<dyn PresentationSink>,
    ) -> Self {
        let sessions = SessionManager::new(
            provider,
            graph,
            Duration::from_millis(config.sweep_settle_delay_ms),
        );
        let dispatcher = CommandDispatcher::new(sessions, host, sink, config.volume_step);

        Self { dispatcher, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sessions(&self) -> &SessionManager {
        self.dispatcher.sessions()
    }

    /// Dispatch a parsed command against the active tab, propagating
    /// errors. Hosts that want the swallow-and-log behavior use
    /// [`Controller::on_command`].
    pub async fn dispatch(&self, command: Command) -> Result<()> {
        self.dispatcher.handle_command(command).await?;
        Ok(())
    }

    /// Handle a raw host command string. Unknown names and every
    /// recoverable failure are logged and absorbed.
    pub async fn on_command(&self, raw: &str) {
        let Some(command) = Command::parse(raw) else {
            tracing::debug!(command = raw, "Ignoring unknown command");
            return;
        };

        if let Err(e) = self.dispatcher.handle_command(command).await {
            log_recovered(command.as_str(), &e);
        }
    }

    /// Toolbar action clicked on `tab`: toggle its mute state.
    pub async fn on_action_clicked(&self, tab: TabId) {
        if let Err(e) = self.dispatcher.on_action_clicked(tab).await {
            log_recovered("action-click", &e);
        }
    }

    /// Context-menu reset for `tab`: destroy the session and restore
    /// default presentation state.
    pub async fn on_reset(&self, tab: TabId) {
        self.dispatcher.reset(tab).await;
    }

    pub async fn on_tab_created(&self, tab: TabId) {
        self.dispatcher.on_tab_created(tab).await;
    }

    pub async fn on_tab_removed(&self, tab: TabId) {
        self.dispatcher.on_tab_removed(tab).await;
    }

    pub async fn on_tab_updated(&self, tab: TabId) {
        self.dispatcher.on_tab_updated(tab).await;
    }

    /// Per-tab state for host UI, without the stream or graph handles.
    pub fn session_snapshot(&self, tab: TabId) -> Option<SessionSnapshot> {
        self.sessions().snapshot(tab)
    }
}

fn log_recovered(context: &str, e: &DispatchError) {
    match e {
        DispatchError::NoActiveTab => {
            tracing::debug!(context, "No active tab, command dropped");
        }
        DispatchError::Session(SessionError::CaptureUnavailable { reason }) => {
            tracing::info!(context, reason = %reason, "Capture unavailable, command dropped");
        }
        DispatchError::Session(SessionError::Cancelled(tab)) => {
            tracing::debug!(context, tab = %tab, "Session creation cancelled mid-command");
        }
        other => {
            tracing::warn!(context, error = %other, "Command failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sordino_platform::fake::{FakeAudioGraph, FakeCaptureProvider, FakeHost, FakeSink};

    fn controller() -> (Arc<FakeHost>, Controller) {
        let host = Arc::new(FakeHost::new());
        let controller = Controller::new(
            Config::default(),
            Arc::new(FakeCaptureProvider::new()),
            Arc::new(FakeAudioGraph::new()),
            Arc::clone(&host) as Arc<dyn TabHost>,
            Arc::new(FakeSink::new()),
        );
        (host, controller)
    }

    #[tokio::test]
    async fn test_unknown_command_is_ignored() {
        let (host, controller) = controller();
        host.set_active_tab(Some(TabId(1)));

        controller.on_command("volume-sideways").await;
        assert_eq!(controller.sessions().session_count(), 0);
    }

    #[tokio::test]
    async fn test_command_with_no_active_tab_is_absorbed() {
        let (_, controller) = controller();
        controller.on_command("volume-up").await;
        assert_eq!(controller.sessions().session_count(), 0);
    }

    #[tokio::test]
    async fn test_command_creates_session() {
        let (host, controller) = controller();
        let tab = TabId(1);
        host.set_active_tab(Some(tab));

        controller.on_command("volume-up").await;

        let snapshot = controller.session_snapshot(tab).unwrap();
        assert_eq!(snapshot.volume, 5);
        assert!(!snapshot.muted);
        assert_eq!(snapshot.gain, 0.05);
    }
}
