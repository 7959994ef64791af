//! Chat-specific UI components.
//!
//! The five views of the application: room directory list, room detail,
//! message list, online-users panel, and the room-create dialog. All are
//! pure render functions over view-state snapshots; liveness comes from the
//! HTMX SSE extension swapping server-rendered fragments.

mod create_room;
mod message_list;
mod notice_banner;
mod online_users;
mod room_list;
mod room_view;

pub use create_room::CreateRoomControl;
pub use message_list::{MessageList, MessageRow, format_message_time, starts_group};
pub use notice_banner::NoticeBanner;
pub use online_users::OnlineUsers;
pub use room_list::RoomList;
pub use room_view::{RoomView, online_count_label};
