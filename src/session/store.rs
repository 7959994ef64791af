//! UI sessions and their store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::chat::RoomSession;
use crate::identity::CurrentUser;

/// Default UI session timeout (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// One browser's server-side state: the signed-in identity plus the
/// currently selected room, if any.
///
/// Cloning shares the underlying session.
#[derive(Debug)]
pub struct UiSession {
    inner: Arc<UiSessionInner>,
}

#[derive(Debug)]
struct UiSessionInner {
    /// Session identifier, carried by the browser's cookie.
    id: String,
    /// The signed-in identity.
    user: CurrentUser,
    /// Access token backing this session, needed for sign-out.
    access_token: String,
    created_at: DateTime<Utc>,
    last_activity: RwLock<DateTime<Utc>>,
    /// The mounted room view, if a room is selected.
    active_room: Mutex<Option<Arc<RoomSession>>>,
}

impl Clone for UiSession {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl UiSession {
    fn new(user: CurrentUser, access_token: String) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(UiSessionInner {
                id: Uuid::new_v4().to_string(),
                user,
                access_token,
                created_at: now,
                last_activity: RwLock::new(now),
                active_room: Mutex::new(None),
            }),
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The signed-in identity.
    #[must_use]
    pub fn user(&self) -> &CurrentUser {
        &self.inner.user
    }

    /// The access token backing this session.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.inner.access_token
    }

    /// The mounted room session, if a room is selected.
    pub async fn active_room(&self) -> Option<Arc<RoomSession>> {
        self.touch();
        self.inner.active_room.lock().await.clone()
    }

    /// Mount `room` as the selection, closing any previously mounted room
    /// exactly once.
    pub async fn enter_room(&self, room: Arc<RoomSession>) -> Arc<RoomSession> {
        self.touch();
        let mut slot = self.inner.active_room.lock().await;
        if let Some(previous) = slot.replace(Arc::clone(&room)) {
            previous.close().await;
        }
        room
    }

    /// Unmount the selection, if any, closing it.
    pub async fn leave_room(&self) {
        self.touch();
        let previous = self.inner.active_room.lock().await.take();
        if let Some(previous) = previous {
            previous.close().await;
        }
    }

    /// Update the last-activity timestamp.
    fn touch(&self) {
        *self
            .inner
            .last_activity
            .write()
            .expect("last_activity lock poisoned") = Utc::now();
    }

    /// Session age.
    #[must_use]
    pub fn age(&self) -> Duration {
        ((Utc::now()) - self.inner.created_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Whether the session has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired(&self, timeout: Duration) -> bool {
        let last = *self
            .inner
            .last_activity
            .read()
            .expect("last_activity lock poisoned");
        (Utc::now() - last).to_std().map_or(false, |idle| idle > timeout)
    }
}

/// Thread-safe store of UI sessions, keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug, Default)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, UiSession>>,
}

impl SessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and register a session for `user`.
    pub fn create(&self, user: CurrentUser, access_token: impl Into<String>) -> UiSession {
        let session = UiSession::new(user, access_token.into());
        self.inner
            .sessions
            .write()
            .expect("sessions lock poisoned")
            .insert(session.id().to_string(), session.clone());
        session
    }

    /// Look up a session by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<UiSession> {
        self.inner
            .sessions
            .read()
            .expect("sessions lock poisoned")
            .get(id)
            .cloned()
    }

    /// Remove a session, returning it so the caller can tear it down.
    pub fn remove(&self, id: &str) -> Option<UiSession> {
        self.inner
            .sessions
            .write()
            .expect("sessions lock poisoned")
            .remove(id)
    }

    /// Number of registered sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .sessions
            .read()
            .expect("sessions lock poisoned")
            .len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collect and remove sessions idle longer than `timeout`. The caller
    /// closes their room sessions.
    pub fn take_expired(&self, timeout: Duration) -> Vec<UiSession> {
        let mut sessions = self
            .inner
            .sessions
            .write()
            .expect("sessions lock poisoned");
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired(timeout))
            .map(|(id, _)| id.clone())
            .collect();
        expired
            .iter()
            .filter_map(|id| sessions.remove(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "ada".into(),
        }
    }

    #[test]
    fn create_and_get_round_trip() {
        let store = SessionStore::new();
        let session = store.create(user(), "token");

        let found = store.get(session.id()).expect("session registered");
        assert_eq!(found.user().username, "ada");
        assert_eq!(found.access_token(), "token");
    }

    #[test]
    fn remove_forgets_the_session() {
        let store = SessionStore::new();
        let session = store.create(user(), "token");

        assert!(store.remove(session.id()).is_some());
        assert!(store.get(session.id()).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn fresh_sessions_are_not_expired() {
        let store = SessionStore::new();
        let session = store.create(user(), "token");
        assert!(!session.is_expired(DEFAULT_SESSION_TIMEOUT));
        assert!(store.take_expired(DEFAULT_SESSION_TIMEOUT).is_empty());
    }
}
