//! Room-create dialog: opener button plus modal form.

use leptos::prelude::*;

use crate::backend::models::MAX_ROOM_NAME_LEN;
use crate::ui::components::{Dialog, PlusIcon};

/// "New Room" button and its modal form.
///
/// The dialog's `open`/`creating`/`name` flags are Alpine client state; the
/// submit button stays disabled while the name is blank or a create request
/// is in flight. Failures are swapped into `#dialog-notices` by the server,
/// leaving the dialog open with the attempted name intact; a successful
/// create redirects into the new room, which discards the dialog state.
#[component]
pub fn CreateRoomControl() -> impl IntoView {
    let maxlength = MAX_ROOM_NAME_LEN.to_string();

    view! {
        <div x-data="{ open: false, creating: false, name: '' }">
            <button
                type="button"
                class="inline-flex h-8 items-center justify-center gap-2 rounded-lg \
                       bg-primary px-3 text-xs font-medium text-white hover:bg-primaryMuted"
                x-on:click="open = true"
            >
                <PlusIcon />
                "New Room"
            </button>

            <Dialog
                title="Create New Room"
                description="Give your chat room a name. Choose something descriptive!"
            >
                <form
                    hx-post="/rooms"
                    hx-target="#dialog-notices"
                    hx-swap="innerHTML"
                    hx-on--before-request="creating = true"
                    hx-on--after-request="creating = false"
                >
                    <label class="grid gap-2 text-sm font-medium">
                        "Room Name"
                        <input
                            type="text"
                            id="room-name"
                            name="name"
                            placeholder="e.g., General, Random, Team Updates..."
                            maxlength=maxlength
                            required
                            autocomplete="off"
                            x-model="name"
                            class="flex h-10 w-full rounded-lg border border-panelBorder \
                                   bg-background px-3 py-2 text-sm text-textPrimary \
                                   placeholder:text-textMuted focus-visible:outline-none \
                                   focus-visible:ring-2 focus-visible:ring-primary"
                        />
                    </label>

                    <div id="dialog-notices" class="mt-2"></div>

                    <div class="mt-4 flex justify-end gap-2">
                        <button
                            type="button"
                            class="inline-flex h-10 items-center justify-center rounded-lg \
                                   border border-panelBorder px-4 text-sm font-medium \
                                   text-textPrimary hover:bg-panel"
                            x-on:click="open = false; name = ''"
                        >
                            "Cancel"
                        </button>
                        <button
                            type="submit"
                            class="inline-flex h-10 items-center justify-center rounded-lg \
                                   bg-primary px-4 text-sm font-medium text-white \
                                   hover:bg-primaryMuted disabled:pointer-events-none \
                                   disabled:opacity-50"
                            x-bind:disabled="!name.trim() || creating"
                            x-text="creating ? 'Creating...' : 'Create Room'"
                        >
                            "Create Room"
                        </button>
                    </div>
                </form>
            </Dialog>
        </div>
    }
}
