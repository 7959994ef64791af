//! Room directory sidebar list.

use leptos::prelude::*;
use uuid::Uuid;

use crate::backend::models::Room;
use crate::ui::components::HashIcon;

/// The room list, or the empty-state invitation to create one.
///
/// Rooms are rendered newest first, exactly as held by the directory.
#[component]
pub fn RoomList(
    /// Rooms, newest first.
    rooms: Vec<Room>,
    /// The currently selected room, highlighted.
    #[prop(default = None)]
    selected: Option<Uuid>,
) -> impl IntoView {
    if rooms.is_empty() {
        return view! {
            <p class="text-textMuted text-sm text-center py-8">
                "No rooms available. Create one to get started!"
            </p>
        }
        .into_any();
    }

    view! {
        <div class="space-y-2">
            {rooms
                .into_iter()
                .map(|room| {
                    let is_selected = selected == Some(room.id);
                    let classes = if is_selected {
                        "flex items-start gap-2 w-full rounded-lg p-3 text-left \
                         bg-primary text-white"
                    } else {
                        "flex items-start gap-2 w-full rounded-lg p-3 text-left \
                         text-textPrimary hover:bg-panel"
                    };
                    let created = room.created_at.format("%Y-%m-%d").to_string();
                    let href = format!("/rooms/{}", room.id);

                    view! {
                        <a href=href class=classes hx-boost="true">
                            <HashIcon class="mt-0.5 shrink-0" />
                            <span class="flex-1 min-w-0">
                                <span class="block font-medium truncate">{room.name.clone()}</span>
                                <span class="block text-xs opacity-70">
                                    "Created " {created}
                                </span>
                            </span>
                        </a>
                    }
                })
                .collect_view()}
        </div>
    }
    .into_any()
}
