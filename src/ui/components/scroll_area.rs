//! Scrollable area component.

use leptos::prelude::*;

/// Scrollable container with custom scrollbar styling.
#[component]
pub fn ScrollArea(
    /// Element id, for HTMX targets and autoscroll hooks.
    #[prop(default = "")]
    id: &'static str,
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
    /// Scrollable content.
    children: Children,
) -> impl IntoView {
    let classes = format!(
        "relative overflow-y-auto scrollbar-thin scrollbar-thumb-panelBorder \
         scrollbar-track-transparent {class}"
    );

    view! {
        <div id=id class=classes>
            {children()}
        </div>
    }
}
