//! Command dispatcher
//!
//! Resolves the active tab, ensures a session exists, applies the
//! command, and emits presentation side effects. Presentation calls
//! are best-effort: a tab can close between the state mutation and the
//! icon update, and the store stays the source of truth either way.

use std::sync::Arc;

use sordino_platform::{IconVariant, PresentationSink, TabHost, TabId};
use sordino_session::{EnsureOutcome, SessionManager};

use crate::command::Command;
use crate::error::DispatchError;
use crate::Result;

#[derive(Clone)]
pub struct CommandDispatcher {
    sessions: SessionManager,
    host: Arc<dyn TabHost>,
    sink: Arc<dyn PresentationSink>,
    /// Volume change per up/down command, in percent
    volume_step: u8,
}

impl CommandDispatcher {
    pub fn new(
        sessions: SessionManager,
        host: Arc<dyn TabHost>,
        sink: Arc<dyn PresentationSink>,
        volume_step: u8,
    ) -> Self {
        Self {
            sessions,
            host,
            sink,
            volume_step,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// Apply `command` to the currently active tab.
    pub async fn handle_command(&self, command: Command) -> Result<()> {
        let tab = self
            .host
            .active_tab()
            .await
            .ok_or(DispatchError::NoActiveTab)?;
        self.dispatch_to(tab, command).await
    }

    /// Apply `command` to a specific tab, creating its session first if
    /// needed. A failed creation aborts the command with no state
    /// change and no presentation update.
    pub async fn dispatch_to(&self, tab: TabId, command: Command) -> Result<()> {
        if self.sessions.ensure_session(tab).await? == EnsureOutcome::Created {
            // The tab was pre-muted at the platform level on creation;
            // lift that now that a controllable session exists.
            self.set_tab_muted(tab, false).await;
        }

        match command {
            Command::MuteToggle => {
                let muted = self.sessions.with_session(tab, |s| s.toggle_mute())?;
                let variant = if muted {
                    IconVariant::Muted
                } else {
                    IconVariant::Default
                };
                tracing::info!(tab = %tab, muted, "Toggled mute");
                self.set_icon(tab, variant).await;
            }
            Command::VolumeUp => {
                let step = self.volume_step;
                let volume = self.sessions.with_session(tab, |s| s.volume_up(step))?;
                tracing::info!(tab = %tab, volume, "Raised volume");
                self.set_badge(tab, &volume.to_string()).await;
            }
            Command::VolumeDown => {
                let step = self.volume_step;
                let volume = self.sessions.with_session(tab, |s| s.volume_down(step))?;
                tracing::info!(tab = %tab, volume, "Lowered volume");
                self.set_badge(tab, &volume.to_string()).await;
            }
        }

        Ok(())
    }

    /// Destroy the tab's session and restore default presentation
    /// state: mute flag cleared, badge cleared, default icon. Applies
    /// the full restore even when no session existed.
    pub async fn reset(&self, tab: TabId) {
        self.sessions.destroy_session(tab);
        self.set_tab_muted(tab, false).await;
        self.set_badge(tab, "").await;
        self.set_icon(tab, IconVariant::Default).await;
        tracing::info!(tab = %tab, "Reset audio state");
    }

    /// Tab created: pre-mute it at the platform level until a
    /// controllable session exists, so no unmodulated audio plays
    /// during the session-creation window.
    pub async fn on_tab_created(&self, tab: TabId) {
        self.set_tab_muted(tab, true).await;
    }

    /// Tab removed: drop its session, then sweep for streams that went
    /// inactive without their own removal event.
    pub async fn on_tab_removed(&self, tab: TabId) {
        self.sessions.destroy_session(tab);
        self.sessions.sweep_inactive().await;
    }

    /// Tab navigated or updated: refresh the badge from the stored
    /// volume. No state mutation.
    pub async fn on_tab_updated(&self, tab: TabId) {
        if let Some(volume) = self.sessions.volume_of(tab) {
            self.set_badge(tab, &volume.to_string()).await;
        }
    }

    /// Toolbar action clicked: behaves as a mute toggle on that tab.
    pub async fn on_action_clicked(&self, tab: TabId) -> Result<()> {
        self.dispatch_to(tab, Command::MuteToggle).await
    }

    async fn set_tab_muted(&self, tab: TabId, muted: bool) {
        if let Err(e) = self.host.set_tab_muted(tab, muted).await {
            tracing::debug!(tab = %tab, error = %e, "Mute flag update failed");
        }
    }

    async fn set_icon(&self, tab: TabId, variant: IconVariant) {
        if let Err(e) = self.sink.set_icon(tab, variant).await {
            tracing::debug!(tab = %tab, error = %e, "Icon update failed");
        }
    }

    async fn set_badge(&self, tab: TabId, text: &str) {
        if let Err(e) = self.sink.set_badge_text(tab, text).await {
            tracing::debug!(tab = %tab, error = %e, "Badge update failed");
        }
    }
}
