//! Ephemeral presence channels.
//!
//! A presence channel mirrors the set of identities currently viewing a room.
//! The platform owns the set: clients announce themselves (`track`), withdraw
//! (`untrack`), and receive `sync` snapshots whenever membership changes.
//! Per the sync contract the local set is replaced wholesale on every `sync`;
//! there is no incremental merge.

use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};

use super::error::BackendError;
use super::feed::FeedGuard;
use super::models::PresenceEntry;

/// Events delivered by a presence channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenceEvent {
    /// The channel is live; self-presence may now be announced.
    Subscribed,
    /// Full snapshot of the room's presence set, in upstream merge order.
    Sync(Vec<PresenceEntry>),
    /// Entries that just joined. Observed, not applied; `Sync` drives state.
    Join(Vec<PresenceEntry>),
    /// Entries that just left. Observed, not applied; `Sync` drives state.
    Leave(Vec<PresenceEntry>),
}

/// Announce/withdraw side of a presence channel.
#[async_trait::async_trait]
pub trait PresenceAgent: Send + Sync {
    /// Announce self-presence on the channel.
    async fn track(&self, entry: PresenceEntry) -> Result<(), BackendError>;

    /// Withdraw the announcement made by `track`.
    async fn untrack(&self) -> Result<(), BackendError>;
}

/// Cloneable handle for announcing and withdrawing presence, detached from
/// the event stream so teardown can withdraw while a watcher owns the events.
#[derive(Clone)]
pub struct PresenceControl {
    agent: Arc<dyn PresenceAgent>,
}

impl PresenceControl {
    /// Announce self-presence.
    pub async fn track(&self, entry: PresenceEntry) -> Result<(), BackendError> {
        self.agent.track(entry).await
    }

    /// Withdraw self-presence.
    pub async fn untrack(&self) -> Result<(), BackendError> {
        self.agent.untrack().await
    }
}

impl std::fmt::Debug for PresenceControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceControl").finish_non_exhaustive()
    }
}

/// A live presence channel scoped to one room.
///
/// Dropping the channel releases the subscription; the platform then reports
/// the client's departure to the remaining members.
pub struct PresenceChannel {
    events: Pin<Box<dyn Stream<Item = PresenceEvent> + Send>>,
    control: PresenceControl,
    _guard: FeedGuard,
}

impl PresenceChannel {
    /// Wrap an event stream, its announce/withdraw agent, and the release
    /// guard.
    pub fn new(
        events: Pin<Box<dyn Stream<Item = PresenceEvent> + Send>>,
        agent: Arc<dyn PresenceAgent>,
        guard: FeedGuard,
    ) -> Self {
        Self {
            events,
            control: PresenceControl { agent },
            _guard: guard,
        }
    }

    /// Handle for track/untrack, usable after the channel moved into a
    /// watcher task.
    #[must_use]
    pub fn control(&self) -> PresenceControl {
        self.control.clone()
    }

    /// Next presence event, or `None` once the channel closed.
    pub async fn next_event(&mut self) -> Option<PresenceEvent> {
        self.events.next().await
    }
}

impl std::fmt::Debug for PresenceChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceChannel").finish_non_exhaustive()
    }
}
