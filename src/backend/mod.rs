//! Access layer for the managed backend platform.
//!
//! Everything durable or realtime — rooms, messages, participants, presence,
//! identity — lives on an external platform and is consumed through its HTTP
//! and SSE APIs. This module defines the [`ChatBackend`] capability trait the
//! rest of the crate is written against, plus the production implementation
//! ([`HttpBackend`]).
//!
//! The trait is injected (`Arc<dyn ChatBackend>`) rather than reached through
//! ambient state, so tests substitute an in-memory fake.
//!
//! # Structure
//!
//! - [`models`]: row and payload types
//! - [`feed`]: change-feed subscriptions and SSE framing
//! - [`presence`]: ephemeral presence channels
//! - [`http`]: `reqwest`-based implementation against the platform's API

mod error;
pub mod feed;
mod http;
pub mod models;
pub mod presence;

pub use error::BackendError;
pub use http::HttpBackend;

use uuid::Uuid;

use feed::ChangeFeed;
use models::{Message, NewMessage, NewRoom, Participant, Room, UserProfile};
use presence::PresenceChannel;

/// Capability interface to the managed backend.
///
/// One method per remote operation the client performs; no operation is
/// retried here — recovery is the caller's (ultimately the user's) concern.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// All rooms, ordered by creation time descending.
    async fn list_rooms(&self) -> Result<Vec<Room>, BackendError>;

    /// Create a room. Duplicate names surface as [`BackendError::Conflict`].
    async fn create_room(&self, room: NewRoom) -> Result<Room, BackendError>;

    /// The most recent `limit` messages of a room, ordered by creation time
    /// ascending.
    async fn recent_messages(&self, room_id: Uuid, limit: usize)
    -> Result<Vec<Message>, BackendError>;

    /// Insert a message. The created row is not returned; it arrives via the
    /// room's change feed.
    async fn send_message(&self, message: NewMessage) -> Result<(), BackendError>;

    /// Upsert a participant row. Duplicate joins surface as
    /// [`BackendError::Conflict`] and are the caller's to swallow.
    async fn join_room(&self, participant: Participant) -> Result<(), BackendError>;

    /// Change feed over the room collection: every mutation, no filtering.
    async fn subscribe_rooms(&self) -> Result<ChangeFeed<Room>, BackendError>;

    /// Insert-only change feed over one room's messages.
    async fn subscribe_messages(&self, room_id: Uuid) -> Result<ChangeFeed<Message>, BackendError>;

    /// Open the ephemeral presence channel for a room.
    async fn join_presence(&self, room_id: Uuid) -> Result<PresenceChannel, BackendError>;

    /// Resolve the identity behind an access token.
    async fn current_user(&self, access_token: &str) -> Result<UserProfile, BackendError>;

    /// Invalidate an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;
}

impl std::fmt::Debug for dyn ChatBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn ChatBackend")
    }
}
