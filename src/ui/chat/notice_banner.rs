//! Dismissible notice banner.

use leptos::prelude::*;

use crate::chat::{Notice, NoticeLevel};
use crate::ui::components::XIcon;

/// Render a [`Notice`] as a dismissible banner.
///
/// Served standalone as an HTMX fragment after failed actions; the close
/// button removes the banner client-side.
#[component]
pub fn NoticeBanner(
    /// The notice to show.
    notice: Notice,
) -> impl IntoView {
    let classes = match notice.level {
        NoticeLevel::Error => {
            "notice flex items-start justify-between gap-2 rounded-lg border \
             border-danger/40 bg-danger/10 px-3 py-2 text-sm text-danger"
        }
        NoticeLevel::Info => {
            "notice flex items-start justify-between gap-2 rounded-lg border \
             border-panelBorder bg-panel px-3 py-2 text-sm text-textPrimary"
        }
    };

    view! {
        <div class=classes role="alert">
            <span class="flex-1">{notice.text}</span>
            <button
                type="button"
                class="shrink-0 opacity-60 hover:opacity-100"
                aria-label="Dismiss"
                x-on:click="$el.closest('.notice').remove()"
            >
                <XIcon class="h-3.5 w-3.5" />
            </button>
        </div>
    }
}
