//! Room directory: the list of rooms and room creation.
//!
//! The directory holds the authoritative local copy of the room list. It is
//! populated by a full fetch on open, then kept current by a watcher task
//! that re-fetches on every room change-feed event — insert, update or
//! delete, with no fine-grained diffing. Renderers and SSE relays observe the
//! list through a revision counter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::backend::feed::ChangeFeed;
use crate::backend::models::{MAX_ROOM_NAME_LEN, NewRoom, Room};
use crate::backend::{BackendError, ChatBackend};
use crate::chat::notice::Notice;
use crate::identity::CurrentUser;

/// Failure modes of [`RoomDirectory::create_room`].
#[derive(Debug, thiserror::Error)]
pub enum CreateRoomError {
    /// The trimmed name was empty.
    #[error("room name must not be empty")]
    EmptyName,

    /// The name exceeds [`MAX_ROOM_NAME_LEN`] characters.
    #[error("room name is too long")]
    NameTooLong,

    /// A room with this name already exists.
    #[error("a room with this name already exists")]
    DuplicateName,

    /// Anything else; the room was not created.
    #[error("failed to create room")]
    Failed(#[source] BackendError),
}

/// Point-in-time view of the directory, for rendering.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    /// Rooms, newest first.
    pub rooms: Vec<Room>,
    /// Whether the first fetch has completed.
    pub loaded: bool,
    /// Notice from the most recent failed fetch, if any.
    pub notice: Option<Notice>,
}

/// The room directory view state.
///
/// Dropping the directory aborts its change-feed watcher.
#[derive(Debug)]
pub struct RoomDirectory {
    inner: Arc<DirectoryInner>,
    watcher: Option<JoinHandle<()>>,
}

#[derive(Debug)]
struct DirectoryInner {
    backend: Arc<dyn ChatBackend>,
    rooms: RwLock<Vec<Room>>,
    /// Set after the first successful fetch; drives the loading placeholder.
    loaded: AtomicBool,
    /// Notice from the most recent failed fetch; cleared on success.
    notice: RwLock<Option<Notice>>,
    /// Bumped on every room-list change; observed by renderers and relays.
    revision: watch::Sender<u64>,
}

impl RoomDirectory {
    /// Open the directory: subscribe to the room change feed, fetch the
    /// room list, and start the watcher.
    ///
    /// The subscription is established before this returns, so no room
    /// created afterwards can slip between fetch and feed. A failed initial
    /// fetch is logged and leaves the list empty; the watcher repopulates it
    /// on the next change event.
    pub async fn open(backend: Arc<dyn ChatBackend>) -> Self {
        let (revision, _) = watch::channel(0);

        let feed = match backend.subscribe_rooms().await {
            Ok(feed) => Some(feed),
            Err(e) => {
                tracing::error!(error = %e, "room change feed unavailable");
                None
            }
        };

        let inner = Arc::new(DirectoryInner {
            backend,
            rooms: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
            notice: RwLock::new(None),
            revision,
        });

        if let Err(e) = inner.refresh().await {
            tracing::error!(error = %e, "initial room fetch failed");
        }

        let watcher = feed.map(|feed| tokio::spawn(Self::watch(Arc::clone(&inner), feed)));

        Self { inner, watcher }
    }

    /// Consume room change events, re-fetching the list on each.
    async fn watch(inner: Arc<DirectoryInner>, mut feed: ChangeFeed<Room>) {
        while let Some(event) = feed.next().await {
            match event {
                Ok(_) => {
                    if let Err(e) = inner.refresh().await {
                        tracing::error!(error = %e, "room refetch failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "room change feed error");
                }
            }
        }
        tracing::debug!("room change feed closed");
    }

    /// Current room list, newest first.
    #[must_use]
    pub fn rooms(&self) -> Vec<Room> {
        self.inner.rooms.read().expect("rooms lock poisoned").clone()
    }

    /// Look up a room by id.
    #[must_use]
    pub fn room(&self, id: Uuid) -> Option<Room> {
        self.inner
            .rooms
            .read()
            .expect("rooms lock poisoned")
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }

    /// Whether the first fetch has completed.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::Acquire)
    }

    /// Everything a renderer needs, read consistently.
    #[must_use]
    pub fn snapshot(&self) -> DirectorySnapshot {
        DirectorySnapshot {
            rooms: self.rooms(),
            loaded: self.is_loaded(),
            notice: self.inner.notice.read().expect("notice lock poisoned").clone(),
        }
    }

    /// Observe room-list revisions; fires whenever the list was re-fetched.
    #[must_use]
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Re-fetch the room list from the backend.
    pub async fn refresh(&self) -> Result<(), BackendError> {
        self.inner.refresh().await
    }

    /// Create a room and return it for selection.
    ///
    /// The local list is not updated here: the change feed fires and the
    /// watcher re-fetches, same as for rooms created by anyone else.
    pub async fn create_room(
        &self,
        name: &str,
        user: &CurrentUser,
    ) -> Result<Room, CreateRoomError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CreateRoomError::EmptyName);
        }
        if name.chars().count() > MAX_ROOM_NAME_LEN {
            return Err(CreateRoomError::NameTooLong);
        }

        let room = NewRoom {
            name: name.to_string(),
            created_by: user.id,
        };

        match self.inner.backend.create_room(room).await {
            Ok(room) => {
                tracing::info!(name: "room.created", room = %room.name, "room created");
                Ok(room)
            }
            Err(e) if e.is_duplicate() => Err(CreateRoomError::DuplicateName),
            Err(e) => {
                tracing::error!(error = %e, "room creation failed");
                Err(CreateRoomError::Failed(e))
            }
        }
    }
}

impl DirectoryInner {
    async fn refresh(&self) -> Result<(), BackendError> {
        match self.backend.list_rooms().await {
            Ok(rooms) => {
                *self.rooms.write().expect("rooms lock poisoned") = rooms;
                self.loaded.store(true, Ordering::Release);
                *self.notice.write().expect("notice lock poisoned") = None;
                self.revision.send_modify(|r| *r += 1);
                Ok(())
            }
            Err(e) => {
                // Prior state is kept; the page surfaces the notice.
                *self.notice.write().expect("notice lock poisoned") =
                    Some(Notice::error("Failed to fetch chat rooms"));
                Err(e)
            }
        }
    }
}

impl Drop for RoomDirectory {
    fn drop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            watcher.abort();
        }
    }
}
