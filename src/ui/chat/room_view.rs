//! Room detail view: header, message panel, input, online-users sidebar.

use chrono::{DateTime, Utc};
use leptos::prelude::*;

use crate::backend::models::{MAX_MESSAGE_LEN, Message, PresenceEntry, Room};
use crate::chat::Notice;
use crate::identity::CurrentUser;
use crate::ui::chat::{MessageList, NoticeBanner, OnlineUsers};
use crate::ui::components::{ArrowLeftIcon, Badge, BadgeVariant, ScrollArea, SendIcon};

/// Label for the online-count badge: "1 user online" / "3 users online".
#[must_use]
pub fn online_count_label(count: usize) -> String {
    if count == 1 {
        "1 user online".to_string()
    } else {
        format!("{count} users online")
    }
}

/// The complete room view for one selected room.
///
/// The wrapper connects to the room's SSE relay: `message` events append
/// rendered rows to the message panel (which then scrolls to the latest
/// entry), `presence` events replace the online-users panel.
#[component]
pub fn RoomView(
    /// The selected room.
    room: Room,
    /// The viewing identity.
    user: CurrentUser,
    /// Initial message window, oldest first.
    messages: Vec<Message>,
    /// Current presence set.
    online: Vec<PresenceEntry>,
    /// Pending notice from the room session, if any.
    #[prop(default = None)]
    notice: Option<Notice>,
    /// Reference instant for relative timestamps.
    now: DateTime<Utc>,
) -> impl IntoView {
    let events_url = format!("/rooms/{}/events", room.id);
    let send_url = format!("/rooms/{}/messages", room.id);
    let placeholder = format!("Message #{}", room.name);
    let count_label = online_count_label(online.len());
    let room_name = room.name.clone();
    let maxlength = MAX_MESSAGE_LEN.to_string();

    view! {
        <div class="h-full flex" hx-ext="sse" sse-connect=events_url>
            <div class="flex-1 flex flex-col min-w-0">
                <header class="border-b border-panelBorder px-4 py-3 flex items-center gap-4 bg-panel/50">
                    <a href="/" class="lg:hidden text-textMuted hover:text-textPrimary" hx-boost="true">
                        <ArrowLeftIcon />
                    </a>
                    <div class="flex items-center gap-3">
                        <h2 class="font-semibold">{format!("# {room_name}")}</h2>
                        <Badge variant=BadgeVariant::Secondary>
                            <span id="online-count" class="text-xs">{count_label}</span>
                        </Badge>
                    </div>
                </header>

                <ScrollArea id="message-scroll" class="flex-1 p-4">
                    <div
                        id="message-list"
                        sse-swap="message"
                        hx-swap="beforeend"
                        x-data
                        x-init="const s = document.getElementById('message-scroll'); s.scrollTop = s.scrollHeight"
                        hx-on--after-swap="const s = document.getElementById('message-scroll'); s.scrollTop = s.scrollHeight"
                    >
                        <MessageList messages=messages current_user=user.id now=now />
                    </div>
                </ScrollArea>

                <div class="border-t border-panelBorder p-4">
                    <div id="room-notices" class="mb-2">
                        {notice.map(|notice| view! { <NoticeBanner notice=notice /> })}
                    </div>

                    <form
                        class="flex gap-2"
                        x-data="{ draft: '', sending: false }"
                        hx-post=send_url
                        hx-target="#room-notices"
                        hx-swap="innerHTML"
                        hx-on--before-request="sending = true"
                        hx-on--after-request="sending = false; if (event.detail.successful && !event.detail.xhr.response) { this.reset(); draft = '' }"
                    >
                        <input
                            type="text"
                            name="content"
                            placeholder=placeholder
                            maxlength=maxlength
                            autocomplete="off"
                            x-model="draft"
                            x-bind:disabled="sending"
                            class="flex h-10 w-full rounded-lg border border-panelBorder \
                                   bg-background px-3 py-2 text-sm text-textPrimary \
                                   placeholder:text-textMuted focus-visible:outline-none \
                                   focus-visible:ring-2 focus-visible:ring-primary \
                                   disabled:opacity-50"
                        />
                        <button
                            type="submit"
                            class="inline-flex h-10 w-10 shrink-0 items-center justify-center \
                                   rounded-lg bg-primary text-white hover:bg-primaryMuted \
                                   disabled:pointer-events-none disabled:opacity-50"
                            x-bind:disabled="!draft.trim() || sending"
                            aria-label="Send"
                        >
                            <SendIcon />
                        </button>
                    </form>
                </div>
            </div>

            <aside class="w-64 border-l border-panelBorder bg-panel/30 p-4 hidden lg:block">
                <div id="online-users" sse-swap="presence" hx-swap="innerHTML">
                    <OnlineUsers users=online />
                </div>
            </aside>
        </div>
    }
}
