//! Client-side view state.
//!
//! The backend owns the data; these types own the local mirror of it that
//! the UI renders, and the reconciliation of that mirror with asynchronous
//! push notifications.
//!
//! # Structure
//!
//! - [`directory`]: the room list and room creation
//! - [`room`]: one selected room — messages, presence, sending
//! - [`notice`]: dismissible user notices

pub mod directory;
pub mod notice;
pub mod room;

pub use directory::{CreateRoomError, DirectorySnapshot, RoomDirectory};
pub use notice::{Notice, NoticeLevel};
pub use room::{RoomEvent, RoomSession, SendError};
