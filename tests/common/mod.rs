//! In-memory [`ChatBackend`] fake for integration tests.
//!
//! Rooms, messages and participants live in a mutex-guarded table; change
//! feeds are tokio broadcast channels; presence channels are per-join probes
//! the test drives by hand. Release guards count drops so tests can assert
//! "released exactly once".

// Each test binary uses its own subset of this module.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use futures::StreamExt;
use tokio::sync::{Notify, broadcast, mpsc};
use tokio_stream::wrappers::{BroadcastStream, UnboundedReceiverStream};
use uuid::Uuid;

use huddle::backend::feed::{ChangeEvent, ChangeFeed, FeedGuard};
use huddle::backend::models::{
    Message, NewMessage, NewRoom, Participant, PresenceEntry, Room, UserProfile,
};
use huddle::backend::presence::{PresenceAgent, PresenceChannel, PresenceEvent};
use huddle::backend::{BackendError, ChatBackend};

/// The access token the fake's auth endpoint accepts.
pub const TEST_TOKEN: &str = "test-token";

/// Handle onto one presence join, for driving and observing it.
pub struct PresenceProbe {
    /// Push presence events into the joined channel.
    pub tx: mpsc::UnboundedSender<PresenceEvent>,
    /// Number of `track` calls seen.
    pub tracks: Arc<AtomicUsize>,
    /// Number of `untrack` calls seen.
    pub untracks: Arc<AtomicUsize>,
    /// Number of times the channel's release guard ran.
    pub releases: Arc<AtomicUsize>,
}

#[derive(Default)]
struct Tables {
    rooms: Vec<Room>,
    messages: Vec<Message>,
    participants: Vec<Participant>,
    clock: i64,
}

/// In-memory stand-in for the managed backend.
pub struct FakeBackend {
    tables: Mutex<Tables>,
    room_events: broadcast::Sender<ChangeEvent<Room>>,
    message_events: broadcast::Sender<Message>,
    presence_probes: Mutex<HashMap<Uuid, Vec<Arc<PresenceProbe>>>>,
    /// While set, `send_message` parks until [`FakeBackend::release_sends`].
    hold_sends: AtomicBool,
    send_gate: Notify,
    /// Number of room-feed release-guard runs.
    pub room_feed_releases: Arc<AtomicUsize>,
    /// Number of message-feed release-guard runs.
    pub message_feed_releases: Arc<AtomicUsize>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let (room_events, _) = broadcast::channel(64);
        let (message_events, _) = broadcast::channel(64);
        Self {
            tables: Mutex::new(Tables::default()),
            room_events,
            message_events,
            presence_probes: Mutex::new(HashMap::new()),
            hold_sends: AtomicBool::new(false),
            send_gate: Notify::new(),
            room_feed_releases: Arc::new(AtomicUsize::new(0)),
            message_feed_releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Monotonic fake timestamps so ordering is deterministic.
    fn next_timestamp(tables: &mut Tables) -> chrono::DateTime<Utc> {
        tables.clock += 1;
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + ChronoDuration::seconds(tables.clock)
    }

    /// Seed a room without going through `create_room` (no feed event).
    pub fn seed_room(&self, name: &str) -> Room {
        let mut tables = self.tables.lock().unwrap();
        let created_at = Self::next_timestamp(&mut tables);
        let room = Room {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_by: Uuid::new_v4(),
            created_at,
        };
        tables.rooms.push(room.clone());
        room
    }

    /// Deliver a message push as if another participant had sent it.
    pub fn push_message(&self, room_id: Uuid, username: &str, content: &str) -> Message {
        let message = {
            let mut tables = self.tables.lock().unwrap();
            let created_at = Self::next_timestamp(&mut tables);
            let message = Message {
                id: Uuid::new_v4(),
                room_id,
                user_id: Uuid::new_v4(),
                username: username.to_string(),
                content: content.to_string(),
                created_at,
            };
            tables.messages.push(message.clone());
            message
        };
        let _ = self.message_events.send(message.clone());
        message
    }

    /// Probes for every presence join on `room_id`, in join order.
    pub fn presence_probes(&self, room_id: Uuid) -> Vec<Arc<PresenceProbe>> {
        self.presence_probes
            .lock()
            .unwrap()
            .get(&room_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Park subsequent `send_message` calls until [`Self::release_sends`].
    pub fn hold_sends(&self) {
        self.hold_sends.store(true, Ordering::SeqCst);
    }

    /// Release every parked `send_message` call.
    pub fn release_sends(&self) {
        self.hold_sends.store(false, Ordering::SeqCst);
        self.send_gate.notify_waiters();
    }

    pub fn participants(&self) -> Vec<Participant> {
        self.tables.lock().unwrap().participants.clone()
    }
}

#[async_trait::async_trait]
impl ChatBackend for FakeBackend {
    async fn list_rooms(&self) -> Result<Vec<Room>, BackendError> {
        let tables = self.tables.lock().unwrap();
        let mut rooms = tables.rooms.clone();
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }

    async fn create_room(&self, room: NewRoom) -> Result<Room, BackendError> {
        let created = {
            let mut tables = self.tables.lock().unwrap();
            if tables.rooms.iter().any(|r| r.name == room.name) {
                return Err(BackendError::Conflict(
                    "duplicate key value violates unique constraint \"rooms_name_key\"".into(),
                ));
            }
            let created_at = Self::next_timestamp(&mut tables);
            let created = Room {
                id: Uuid::new_v4(),
                name: room.name,
                created_by: room.created_by,
                created_at,
            };
            tables.rooms.push(created.clone());
            created
        };
        let _ = self.room_events.send(ChangeEvent::Insert(created.clone()));
        Ok(created)
    }

    async fn recent_messages(
        &self,
        room_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Message>, BackendError> {
        let tables = self.tables.lock().unwrap();
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.room_id == room_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let skip = messages.len().saturating_sub(limit);
        Ok(messages.split_off(skip))
    }

    async fn send_message(&self, message: NewMessage) -> Result<(), BackendError> {
        if self.hold_sends.load(Ordering::SeqCst) {
            self.send_gate.notified().await;
        }

        let stored = {
            let mut tables = self.tables.lock().unwrap();
            let created_at = Self::next_timestamp(&mut tables);
            let stored = Message {
                id: Uuid::new_v4(),
                room_id: message.room_id,
                user_id: message.user_id,
                username: message.username,
                content: message.content,
                created_at,
            };
            tables.messages.push(stored.clone());
            stored
        };
        let _ = self.message_events.send(stored);
        Ok(())
    }

    async fn join_room(&self, participant: Participant) -> Result<(), BackendError> {
        let mut tables = self.tables.lock().unwrap();
        if tables
            .participants
            .iter()
            .any(|p| p.room_id == participant.room_id && p.user_id == participant.user_id)
        {
            return Err(BackendError::Conflict(
                "duplicate key value violates unique constraint".into(),
            ));
        }
        tables.participants.push(participant);
        Ok(())
    }

    async fn subscribe_rooms(&self) -> Result<ChangeFeed<Room>, BackendError> {
        let stream = BroadcastStream::new(self.room_events.subscribe())
            .filter_map(|event| async move { event.ok().map(Ok) });
        let releases = Arc::clone(&self.room_feed_releases);
        let guard = FeedGuard::new(move || {
            releases.fetch_add(1, Ordering::SeqCst);
        });
        Ok(ChangeFeed::new(Box::pin(stream), guard))
    }

    async fn subscribe_messages(&self, room_id: Uuid) -> Result<ChangeFeed<Message>, BackendError> {
        let stream = BroadcastStream::new(self.message_events.subscribe()).filter_map(
            move |event| async move {
                match event {
                    Ok(message) if message.room_id == room_id => {
                        Some(Ok(ChangeEvent::Insert(message)))
                    }
                    _ => None,
                }
            },
        );
        let releases = Arc::clone(&self.message_feed_releases);
        let guard = FeedGuard::new(move || {
            releases.fetch_add(1, Ordering::SeqCst);
        });
        Ok(ChangeFeed::new(Box::pin(stream), guard))
    }

    async fn join_presence(&self, room_id: Uuid) -> Result<PresenceChannel, BackendError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let probe = Arc::new(PresenceProbe {
            tx: tx.clone(),
            tracks: Arc::new(AtomicUsize::new(0)),
            untracks: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        });

        // The platform confirms the subscription as the first event.
        let _ = tx.send(PresenceEvent::Subscribed);

        self.presence_probes
            .lock()
            .unwrap()
            .entry(room_id)
            .or_default()
            .push(Arc::clone(&probe));

        let agent = Arc::new(FakePresenceAgent {
            tracks: Arc::clone(&probe.tracks),
            untracks: Arc::clone(&probe.untracks),
        });
        let releases = Arc::clone(&probe.releases);
        let guard = FeedGuard::new(move || {
            releases.fetch_add(1, Ordering::SeqCst);
        });

        Ok(PresenceChannel::new(
            Box::pin(UnboundedReceiverStream::new(rx)),
            agent,
            guard,
        ))
    }

    async fn current_user(&self, access_token: &str) -> Result<UserProfile, BackendError> {
        if access_token == TEST_TOKEN {
            Ok(UserProfile {
                id: Uuid::new_v4(),
                email: Some("ada@example.com".into()),
                display_name: Some("Ada".into()),
            })
        } else {
            Err(BackendError::Unauthorized)
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

struct FakePresenceAgent {
    tracks: Arc<AtomicUsize>,
    untracks: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl PresenceAgent for FakePresenceAgent {
    async fn track(&self, _entry: PresenceEntry) -> Result<(), BackendError> {
        self.tracks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn untrack(&self) -> Result<(), BackendError> {
        self.untracks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Poll `predicate` until it holds or the timeout elapses.
pub async fn wait_until(predicate: impl Fn() -> bool) {
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    while !predicate() {
        assert!(
            std::time::Instant::now() < deadline,
            "condition not reached within timeout"
        );
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
}
