//! Modal dialog component.
//!
//! Visibility is client state: the dialog participates in an Alpine scope
//! that exposes an `open` flag, toggled by the opener button and the
//! cancel/backdrop handlers.

use leptos::prelude::*;

/// Modal dialog, shown while the surrounding Alpine scope's `open` is true.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <div x-data="{ open: false }">
///         <button x-on:click="open = true">"New Room"</button>
///         <Dialog title="Create New Room".to_string()>
///             // form content
///         </Dialog>
///     </div>
/// }
/// ```
#[component]
pub fn Dialog(
    /// Dialog heading.
    #[prop(into)]
    title: String,
    /// Supporting description under the heading.
    #[prop(into, default = String::new())]
    description: String,
    /// Dialog body.
    children: Children,
) -> impl IntoView {
    view! {
        <div
            class="fixed inset-0 z-50 flex items-center justify-center"
            x-show="open"
            x-cloak
        >
            <div
                class="absolute inset-0 bg-black/60"
                x-on:click="open = false"
            />
            <div
                class="relative z-10 w-full max-w-[425px] rounded-xl border border-panelBorder \
                       bg-panel p-6 shadow-lg"
                role="dialog"
                aria-modal="true"
            >
                <h2 class="text-lg font-semibold">{title}</h2>
                {(!description.is_empty()).then(|| view! {
                    <p class="mt-1 text-sm text-textMuted">{description}</p>
                })}
                <div class="mt-4">
                    {children()}
                </div>
            </div>
        </div>
    }
}
