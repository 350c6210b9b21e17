//! Session store
//!
//! The authoritative in-memory record of which tabs have audio
//! sessions. Each tab occupies at most one slot, tagged either
//! `Creating` (a capture request is in flight) or `Active` (a stored
//! session); an absent slot means the tab has no session.
//!
//! The `Creating` tag closes the duplicate-creation race: a command
//! that finds one awaits the slot's settle signal instead of issuing a
//! second capture request. A destruction request that finds one marks
//! it cancelled so the creating task tears its stream down instead of
//! storing it.
//!
//! The lock is never held across an await point; all waiting happens on
//! the settle channel outside the lock.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use uuid::Uuid;

use sordino_platform::TabId;

use crate::session::{Session, SessionSnapshot};

/// In-flight creation marker. The ticket ties a creating task to its
/// slot so a stale task cannot clobber a slot it no longer owns.
struct Creating {
    ticket: Uuid,
    cancelled: bool,
    settled: watch::Receiver<bool>,
}

enum Slot {
    Creating(Creating),
    Active(Session),
}

/// Outcome of an attempt to start creating a session for a tab.
pub(crate) enum BeginCreation {
    /// This caller owns the creation; it must settle the channel when
    /// the attempt finishes, whatever the outcome.
    Installed {
        ticket: Uuid,
        settle: watch::Sender<bool>,
    },
    /// Another caller is already creating; await this receiver.
    InFlight(watch::Receiver<bool>),
    /// A session already exists.
    AlreadyActive,
}

/// What a waiter sees when it re-inspects a slot after a settle signal.
pub(crate) enum SlotView {
    Active,
    Creating(watch::Receiver<bool>),
    Absent,
}

/// Result of removing a tab's slot.
pub(crate) enum Removed {
    /// An active session was removed; the caller must tear it down.
    Session(Session),
    /// A creation was in flight and is now marked cancelled; the
    /// creating task will tear down its stream.
    CreationCancelled,
    Absent,
}

#[derive(Clone, Default)]
pub struct SessionStore {
    slots: Arc<RwLock<HashMap<TabId, Slot>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_creation(&self, tab: TabId) -> BeginCreation {
        let mut slots = self.slots.write();

        if let Some(slot) = slots.get(&tab) {
            return match slot {
                Slot::Active(_) => BeginCreation::AlreadyActive,
                Slot::Creating(creating) => BeginCreation::InFlight(creating.settled.clone()),
            };
        }

        let (settle, settled) = watch::channel(false);
        let ticket = Uuid::new_v4();
        slots.insert(
            tab,
            Slot::Creating(Creating {
                ticket,
                cancelled: false,
                settled,
            }),
        );

        BeginCreation::Installed { ticket, settle }
    }

    /// Store a freshly created session, unless the creation was
    /// cancelled or the slot is no longer ours. On `Err` the caller
    /// gets the session back and must tear it down.
    pub(crate) fn complete_creation(
        &self,
        tab: TabId,
        ticket: Uuid,
        session: Session,
    ) -> Result<(), Session> {
        let mut slots = self.slots.write();

        let live = matches!(
            slots.get(&tab),
            Some(Slot::Creating(c)) if c.ticket == ticket && !c.cancelled
        );
        if live {
            slots.insert(tab, Slot::Active(session));
            return Ok(());
        }

        // Cancelled creations leave their marker for us to clear.
        if matches!(slots.get(&tab), Some(Slot::Creating(c)) if c.ticket == ticket) {
            slots.remove(&tab);
        }
        Err(session)
    }

    /// Remove a `Creating` marker whose settle sender is gone, meaning
    /// the creating task was dropped before it could settle. Leaves
    /// live creations alone. Returns whether a stale marker was
    /// removed.
    pub(crate) fn clear_dead_creation(&self, tab: TabId) -> bool {
        let mut slots = self.slots.write();
        let dead = matches!(
            slots.get(&tab),
            Some(Slot::Creating(c)) if c.settled.has_changed().is_err()
        );
        if dead {
            slots.remove(&tab);
        }
        dead
    }

    /// Clear our creation marker after a failed capture attempt.
    pub(crate) fn abort_creation(&self, tab: TabId, ticket: Uuid) {
        let mut slots = self.slots.write();
        if matches!(slots.get(&tab), Some(Slot::Creating(c)) if c.ticket == ticket) {
            slots.remove(&tab);
        }
    }

    pub(crate) fn slot_view(&self, tab: TabId) -> SlotView {
        match self.slots.read().get(&tab) {
            Some(Slot::Active(_)) => SlotView::Active,
            Some(Slot::Creating(creating)) => SlotView::Creating(creating.settled.clone()),
            None => SlotView::Absent,
        }
    }

    pub(crate) fn remove(&self, tab: TabId) -> Removed {
        let mut slots = self.slots.write();

        if let Some(Slot::Creating(creating)) = slots.get_mut(&tab) {
            creating.cancelled = true;
            return Removed::CreationCancelled;
        }

        match slots.remove(&tab) {
            Some(Slot::Active(session)) => Removed::Session(session),
            _ => Removed::Absent,
        }
    }

    /// Remove every active session whose backing stream has gone
    /// inactive. Returns the removed sessions for teardown.
    pub(crate) fn drain_inactive(&self) -> Vec<Session> {
        let mut slots = self.slots.write();

        let stale: Vec<TabId> = slots
            .iter()
            .filter_map(|(tab, slot)| match slot {
                Slot::Active(session) if !session.is_active() => Some(*tab),
                _ => None,
            })
            .collect();

        stale
            .into_iter()
            .filter_map(|tab| match slots.remove(&tab) {
                Some(Slot::Active(session)) => Some(session),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn with_active<T>(
        &self,
        tab: TabId,
        f: impl FnOnce(&mut Session) -> T,
    ) -> Option<T> {
        let mut slots = self.slots.write();
        match slots.get_mut(&tab) {
            Some(Slot::Active(session)) => Some(f(session)),
            _ => None,
        }
    }

    /// Whether the tab currently has a stored (Active) session.
    pub fn contains(&self, tab: TabId) -> bool {
        matches!(self.slots.read().get(&tab), Some(Slot::Active(_)))
    }

    /// Number of stored sessions, not counting in-flight creations.
    pub fn active_count(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| matches!(slot, Slot::Active(_)))
            .count()
    }

    pub fn snapshot(&self, tab: TabId) -> Option<SessionSnapshot> {
        match self.slots.read().get(&tab) {
            Some(Slot::Active(session)) => Some(session.snapshot()),
            _ => None,
        }
    }
}
