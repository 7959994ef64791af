//! Row types exchanged with the managed backend.
//!
//! These mirror the platform's `rooms`, `messages` and `room_participants`
//! collections plus the ephemeral presence payload. All of them are opaque to
//! this crate beyond (de)serialization: the platform owns the schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a message body, enforced before submission.
pub const MAX_MESSAGE_LEN: usize = 500;

/// Maximum length of a room name, enforced before submission.
pub const MAX_ROOM_NAME_LEN: usize = 50;

/// A named channel scoping a set of messages and participants.
///
/// Rooms are created by explicit user action and never updated or deleted by
/// this client. Name uniqueness is enforced by the platform; a violation
/// surfaces as [`BackendError::Conflict`](super::BackendError::Conflict).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    /// Stable room identifier.
    pub id: Uuid,
    /// Display name, unique among rooms.
    pub name: String,
    /// Identifier of the creating user.
    pub created_by: Uuid,
    /// Creation timestamp assigned by the platform.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new room.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewRoom {
    pub name: String,
    pub created_by: Uuid,
}

/// A chat message. Immutable once created; ordered by `created_at` ascending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Stable message identifier.
    pub id: Uuid,
    /// Owning room.
    pub room_id: Uuid,
    /// Author identifier.
    pub user_id: Uuid,
    /// Author display name, denormalized at send time.
    pub username: String,
    /// Body text, at most [`MAX_MESSAGE_LEN`] characters.
    pub content: String,
    /// Creation timestamp assigned by the platform.
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub content: String,
}

/// Durable join-table row recording that a user has joined a room.
///
/// Distinct from ephemeral presence: the row outlives the connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Participant {
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
}

/// One entry of a room's ephemeral presence set.
///
/// Exists only while the owning client's live connection is active; the
/// platform's liveness tracking owns the set, this client merely mirrors it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceEntry {
    pub user_id: Uuid,
    pub username: String,
    pub joined_at: DateTime<Utc>,
}

/// Identity record returned by the platform's auth API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable user identifier.
    pub id: Uuid,
    /// Account email, if the provider exposes one.
    #[serde(default)]
    pub email: Option<String>,
    /// Preferred display name, if the user set one.
    #[serde(default)]
    pub display_name: Option<String>,
}
