//! Message list rendering: grouping and relative timestamps.
//!
//! Pure presentation over an ordered message list. Consecutive messages from
//! the same author collapse into one header run; the header shows the author
//! and a relative timestamp (clock time under 24 hours, month/day beyond).

use chrono::{DateTime, Utc};
use leptos::prelude::*;
use uuid::Uuid;

use crate::backend::models::Message;
use crate::ui::components::{Avatar, MessageCircleIcon, avatar_initial};

/// Relative timestamp: `14:05` for messages under 24 hours old, `Mar 7`
/// otherwise.
#[must_use]
pub fn format_message_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if now.signed_duration_since(timestamp) < chrono::Duration::hours(24) {
        timestamp.format("%H:%M").to_string()
    } else {
        timestamp.format("%b %-d").to_string()
    }
}

/// Whether `message` starts a new author run (and gets a header + avatar).
#[must_use]
pub fn starts_group(previous: Option<&Message>, message: &Message) -> bool {
    previous.is_none_or(|p| p.user_id != message.user_id)
}

/// The ordered message list, or the empty-state notice.
#[component]
pub fn MessageList(
    /// Messages, oldest first.
    messages: Vec<Message>,
    /// The viewing user; their messages align right.
    current_user: Uuid,
    /// Reference instant for relative timestamps.
    now: DateTime<Utc>,
) -> impl IntoView {
    if messages.is_empty() {
        return view! {
            <div class="text-center py-8">
                <MessageCircleIcon class="mx-auto mb-2 h-6 w-6 text-textMuted" />
                <p class="text-textMuted">"No messages yet. Start the conversation!"</p>
            </div>
        }
        .into_any();
    }

    let mut rows = Vec::with_capacity(messages.len());
    let mut previous: Option<&Message> = None;
    for message in &messages {
        rows.push((message.clone(), starts_group(previous, message)));
        previous = Some(message);
    }

    view! {
        <div class="space-y-1">
            {rows
                .into_iter()
                .map(|(message, show_header)| {
                    view! {
                        <MessageRow message=message show_header=show_header current_user=current_user now=now />
                    }
                })
                .collect_view()}
        </div>
    }
    .into_any()
}

/// One message row. Also rendered standalone for live appends.
#[component]
pub fn MessageRow(
    /// The message.
    message: Message,
    /// Whether this row starts an author run.
    show_header: bool,
    /// The viewing user.
    current_user: Uuid,
    /// Reference instant for relative timestamps.
    now: DateTime<Utc>,
) -> impl IntoView {
    let own = message.user_id == current_user;
    let row_classes = if own {
        "flex gap-3 flex-row-reverse"
    } else {
        "flex gap-3"
    };
    let body_classes = if own {
        "flex-1 max-w-[70%] text-right"
    } else {
        "flex-1 max-w-[70%]"
    };
    let header_classes = if own {
        "flex items-center gap-2 mb-1 justify-end"
    } else {
        "flex items-center gap-2 mb-1"
    };
    let bubble_classes = if own {
        "inline-block px-3 py-2 rounded-lg break-words bg-primary text-white"
    } else {
        "inline-block px-3 py-2 rounded-lg break-words bg-panel"
    };

    let time = format_message_time(message.created_at, now);
    let initial = avatar_initial(&message.username);
    let username = message.username.clone();

    view! {
        <div class=row_classes>
            <div class="shrink-0">
                {if show_header {
                    view! { <Avatar initial=initial /> }.into_any()
                } else {
                    view! { <div class="h-8 w-8" /> }.into_any()
                }}
            </div>

            <div class=body_classes>
                {show_header.then(|| view! {
                    <div class=header_classes>
                        <span class="text-sm font-medium">{username}</span>
                        <span class="text-xs text-textMuted">{time}</span>
                    </div>
                })}

                <div class=bubble_classes>{message.content.clone()}</div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(user: Uuid, content: &str, at: DateTime<Utc>) -> Message {
        Message {
            id: Uuid::new_v4(),
            room_id: Uuid::new_v4(),
            user_id: user,
            username: "someone".into(),
            content: content.into(),
            created_at: at,
        }
    }

    #[test]
    fn consecutive_same_author_collapses() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let t0 = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();

        let messages = vec![
            message(a, "hi", t0),
            message(a, "there", t0 + chrono::Duration::seconds(5)),
            message(b, "hey", t0 + chrono::Duration::seconds(10)),
        ];

        let headers: Vec<bool> = {
            let mut previous = None;
            messages
                .iter()
                .map(|m| {
                    let h = starts_group(previous, m);
                    previous = Some(m);
                    h
                })
                .collect()
        };

        assert_eq!(headers, vec![true, false, true]);
    }

    #[test]
    fn first_message_always_starts_a_group() {
        let m = message(
            Uuid::new_v4(),
            "hello",
            Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap(),
        );
        assert!(starts_group(None, &m));
    }

    #[test]
    fn recent_messages_show_clock_time() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 18, 30, 0).unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 3, 7, 9, 5, 0).unwrap();
        assert_eq!(format_message_time(ts, now), "09:05");
    }

    #[test]
    fn old_messages_show_month_and_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 18, 30, 0).unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 3, 5, 9, 5, 0).unwrap();
        assert_eq!(format_message_time(ts, now), "Mar 5");
    }

    #[test]
    fn exactly_on_the_day_boundary_is_old() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 9, 0, 0).unwrap();
        let ts = Utc.with_ymd_and_hms(2026, 3, 6, 9, 0, 0).unwrap();
        assert_eq!(format_message_time(ts, now), "Mar 6");
    }
}
