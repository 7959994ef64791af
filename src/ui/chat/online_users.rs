//! Online-users panel: the room's presence set.

use leptos::prelude::*;

use crate::backend::models::PresenceEntry;
use crate::ui::components::{Avatar, UsersIcon, avatar_initial};

/// The presence panel: count header plus one row per online user, in the
/// order the presence sync delivered them.
#[component]
pub fn OnlineUsers(
    /// The presence set.
    users: Vec<PresenceEntry>,
) -> impl IntoView {
    let count = users.len();

    view! {
        <div class="h-full flex flex-col">
            <div class="flex items-center gap-2 mb-4">
                <UsersIcon />
                <h3 class="font-semibold">"Online (" {count} ")"</h3>
            </div>

            <div class="flex-1 overflow-y-auto space-y-2">
                {if users.is_empty() {
                    view! {
                        <p class="text-sm text-textMuted text-center py-4">
                            "No users online"
                        </p>
                    }
                    .into_any()
                } else {
                    users
                        .into_iter()
                        .map(|user| {
                            let initial = avatar_initial(&user.username);
                            view! {
                                <div class="flex items-center gap-3 p-2 rounded-lg hover:bg-panel/50">
                                    <Avatar initial=initial online=true />
                                    <div class="flex-1 min-w-0">
                                        <p class="text-sm font-medium truncate">{user.username}</p>
                                        <p class="text-xs text-textMuted">"Online"</p>
                                    </div>
                                </div>
                            }
                        })
                        .collect_view()
                        .into_any()
                }}
            </div>
        </div>
    }
}
