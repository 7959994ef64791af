//! Room session: the view state of one selected room.
//!
//! A [`RoomSession`] lives exactly as long as a room selection. Opening one:
//!
//! 1. upserts the durable participant row (conflicts swallowed, other
//!    failures logged and not surfaced),
//! 2. opens the presence channel, announcing self-presence once the channel
//!    confirms subscription and replacing the local presence set wholesale on
//!    every sync event,
//! 3. fetches the most recent 50 messages, oldest first,
//! 4. subscribes to insert events for the room, appending each pushed message
//!    in arrival order — no re-sort and no dedup against the initial window.
//!
//! Closing withdraws the presence announcement, then aborts both watcher
//! tasks; dropping the channel and feed releases the subscriptions, and no
//! event for the departed room is processed afterwards. Close is idempotent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::backend::feed::{ChangeEvent, ChangeFeed};
use crate::backend::models::{
    MAX_MESSAGE_LEN, Message, NewMessage, Participant, PresenceEntry, Room,
};
use crate::backend::presence::{PresenceChannel, PresenceControl, PresenceEvent};
use crate::backend::{BackendError, ChatBackend};
use crate::chat::notice::Notice;
use crate::identity::CurrentUser;

/// How many messages the initial fetch loads.
const INITIAL_MESSAGE_WINDOW: usize = 50;

/// State changes published to observers (the SSE relay, tests).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RoomEvent {
    /// A message was appended to the list.
    Message(Message),
    /// The presence set was replaced.
    Presence {
        /// The new set, in upstream merge order.
        online: Vec<PresenceEntry>,
    },
}

/// Failure modes of [`RoomSession::send`].
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The trimmed draft was empty.
    #[error("message must not be empty")]
    Empty,

    /// The draft exceeds [`MAX_MESSAGE_LEN`] characters.
    #[error("message is too long")]
    TooLong,

    /// Another send is still in flight; the duplicate is rejected.
    #[error("a send is already in flight")]
    InFlight,

    /// The backend rejected the message; the draft should be kept.
    #[error("failed to send message")]
    Failed(#[source] BackendError),
}

/// View state of one selected room.
#[derive(Debug)]
pub struct RoomSession {
    inner: Arc<RoomInner>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

#[derive(Debug)]
struct RoomInner {
    backend: Arc<dyn ChatBackend>,
    room: Room,
    user: CurrentUser,
    messages: RwLock<Vec<Message>>,
    online: RwLock<Vec<PresenceEntry>>,
    notice: RwLock<Option<Notice>>,
    sending: AtomicBool,
    presence: Option<PresenceControl>,
    events: broadcast::Sender<RoomEvent>,
}

impl RoomSession {
    /// Open a session for `room` on behalf of `user`.
    ///
    /// Opening never fails outright; setup failures degrade per the error
    /// taxonomy (participant upsert and realtime failures are logged, a
    /// failed message fetch leaves an error notice and an empty list).
    pub async fn open(backend: Arc<dyn ChatBackend>, room: Room, user: CurrentUser) -> Self {
        // (a) durable participant row; duplicates mean "already a member"
        let participant = Participant {
            room_id: room.id,
            user_id: user.id,
            username: user.username.clone(),
        };
        match backend.join_room(participant).await {
            Ok(()) => {}
            Err(e) if e.is_duplicate() => {
                tracing::debug!(room = %room.name, "already a participant");
            }
            Err(e) => {
                tracing::warn!(room = %room.name, error = %e, "participant upsert failed");
            }
        }

        // (b) presence channel
        let channel = match backend.join_presence(room.id).await {
            Ok(channel) => Some(channel),
            Err(e) => {
                tracing::warn!(room = %room.name, error = %e, "presence unavailable");
                None
            }
        };

        // (c) initial message window
        let mut notice = None;
        let messages = match backend
            .recent_messages(room.id, INITIAL_MESSAGE_WINDOW)
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                tracing::error!(room = %room.name, error = %e, "message fetch failed");
                notice = Some(Notice::error("Failed to load messages"));
                Vec::new()
            }
        };

        // (d) insert-only message feed
        let feed = match backend.subscribe_messages(room.id).await {
            Ok(feed) => Some(feed),
            Err(e) => {
                tracing::warn!(room = %room.name, error = %e, "message feed unavailable");
                None
            }
        };

        let (events, _) = broadcast::channel(64);
        let inner = Arc::new(RoomInner {
            backend,
            room,
            user,
            messages: RwLock::new(messages),
            online: RwLock::new(Vec::new()),
            notice: RwLock::new(notice),
            sending: AtomicBool::new(false),
            presence: channel.as_ref().map(PresenceChannel::control),
            events,
        });

        let mut tasks = Vec::new();
        if let Some(channel) = channel {
            tasks.push(tokio::spawn(Self::watch_presence(
                Arc::clone(&inner),
                channel,
            )));
        }
        if let Some(feed) = feed {
            tasks.push(tokio::spawn(Self::watch_messages(Arc::clone(&inner), feed)));
        }

        Self {
            inner,
            tasks: Mutex::new(tasks),
            closed: AtomicBool::new(false),
        }
    }

    /// Consume presence events for the lifetime of the selection.
    async fn watch_presence(inner: Arc<RoomInner>, mut channel: PresenceChannel) {
        while let Some(event) = channel.next_event().await {
            match event {
                PresenceEvent::Subscribed => {
                    let entry = PresenceEntry {
                        user_id: inner.user.id,
                        username: inner.user.username.clone(),
                        joined_at: Utc::now(),
                    };
                    if let Err(e) = channel.control().track(entry).await {
                        tracing::warn!(room = %inner.room.name, error = %e, "presence announce failed");
                    }
                }
                PresenceEvent::Sync(entries) => {
                    // Wholesale replace, never merge.
                    *inner.online.write().expect("online lock poisoned") = entries.clone();
                    let _ = inner.events.send(RoomEvent::Presence { online: entries });
                }
                PresenceEvent::Join(entries) => {
                    tracing::debug!(room = %inner.room.name, joined = entries.len(), "presence join");
                }
                PresenceEvent::Leave(entries) => {
                    tracing::debug!(room = %inner.room.name, left = entries.len(), "presence leave");
                }
            }
        }
        tracing::debug!(room = %inner.room.name, "presence channel closed");
    }

    /// Consume message inserts for the lifetime of the selection.
    async fn watch_messages(inner: Arc<RoomInner>, mut feed: ChangeFeed<Message>) {
        while let Some(event) = feed.next().await {
            match event {
                Ok(ChangeEvent::Insert(message)) => {
                    // Appended in arrival order; upstream delivery order is
                    // trusted to match creation order.
                    inner
                        .messages
                        .write()
                        .expect("messages lock poisoned")
                        .push(message.clone());
                    let _ = inner.events.send(RoomEvent::Message(message));
                }
                Ok(other) => {
                    tracing::debug!(room = %inner.room.name, event = ?other, "ignoring non-insert");
                }
                Err(e) => {
                    tracing::warn!(room = %inner.room.name, error = %e, "message feed error");
                }
            }
        }
        tracing::debug!(room = %inner.room.name, "message feed closed");
    }

    /// The room this session is scoped to.
    #[must_use]
    pub fn room(&self) -> &Room {
        &self.inner.room
    }

    /// The identity this session acts as.
    #[must_use]
    pub fn user(&self) -> &CurrentUser {
        &self.inner.user
    }

    /// Snapshot of the message list, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner
            .messages
            .read()
            .expect("messages lock poisoned")
            .clone()
    }

    /// Snapshot of the presence set, in upstream merge order.
    #[must_use]
    pub fn online(&self) -> Vec<PresenceEntry> {
        self.inner.online.read().expect("online lock poisoned").clone()
    }

    /// Pending notice, if any.
    #[must_use]
    pub fn notice(&self) -> Option<Notice> {
        self.inner.notice.read().expect("notice lock poisoned").clone()
    }

    /// Dismiss the pending notice.
    pub fn dismiss_notice(&self) {
        *self.inner.notice.write().expect("notice lock poisoned") = None;
    }

    /// Observe state changes.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<RoomEvent> {
        self.inner.events.subscribe()
    }

    /// Whether [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Send a message authored by this session's user.
    ///
    /// The message is not appended locally; it arrives through the change
    /// feed like everyone else's. On failure the caller keeps the draft.
    pub async fn send(&self, text: &str) -> Result<(), SendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::Empty);
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(SendError::TooLong);
        }
        if self.inner.sending.swap(true, Ordering::AcqRel) {
            return Err(SendError::InFlight);
        }

        let message = NewMessage {
            room_id: self.inner.room.id,
            user_id: self.inner.user.id,
            username: self.inner.user.username.clone(),
            content: text.to_string(),
        };

        let result = self.inner.backend.send_message(message).await;
        self.inner.sending.store(false, Ordering::Release);

        result.map_err(|e| {
            tracing::error!(room = %self.inner.room.name, error = %e, "send failed");
            SendError::Failed(e)
        })
    }

    /// Leave the room: withdraw presence, then release the channel and the
    /// message subscription. Idempotent; later calls are no-ops.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        if let Some(presence) = &self.inner.presence {
            if let Err(e) = presence.untrack().await {
                tracing::debug!(room = %self.inner.room.name, error = %e, "presence withdraw failed");
            }
        }

        let tasks = std::mem::take(&mut *self.tasks.lock().expect("tasks lock poisoned"));
        for task in tasks {
            task.abort();
        }

        tracing::debug!(room = %self.inner.room.name, "room session closed");
    }
}

impl Drop for RoomSession {
    fn drop(&mut self) {
        // Backstop for callers that never closed explicitly: the watchers
        // must not outlive the selection. The presence announcement is left
        // to the platform's liveness timeout in this path.
        if !self.closed.load(Ordering::Acquire) {
            for task in self.tasks.lock().expect("tasks lock poisoned").drain(..) {
                task.abort();
            }
        }
    }
}
