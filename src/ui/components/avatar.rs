//! Avatar component rendering a user's initial.
//!
//! The platform does not serve profile images, so avatars are always the
//! initial-letter fallback, optionally decorated with an online indicator.

use leptos::prelude::*;

/// Avatar with initial fallback.
///
/// # Example
///
/// ```rust,ignore
/// view! {
///     <Avatar initial="A".to_string() online=true />
/// }
/// ```
#[component]
pub fn Avatar(
    /// The initial (usually one uppercased character) to show.
    #[prop(into)]
    initial: String,
    /// Whether to show the green online dot.
    #[prop(default = false)]
    online: bool,
    /// Size class (e.g. "h-8 w-8").
    #[prop(default = "h-8 w-8")]
    size: &'static str,
    /// Additional CSS classes.
    #[prop(default = "")]
    class: &'static str,
) -> impl IntoView {
    let container_classes = format!("relative inline-block shrink-0 {class}");
    let circle_classes = format!(
        "flex {size} items-center justify-center overflow-hidden rounded-full \
         bg-panel text-textMuted text-xs font-medium"
    );

    view! {
        <span class=container_classes>
            <span class=circle_classes>{initial}</span>
            {online.then(|| view! {
                <span class="absolute -bottom-0.5 -right-0.5 h-3 w-3 rounded-full \
                             bg-success border-2 border-background" />
            })}
        </span>
    }
}

/// Uppercased first character of a username, for avatar fallbacks.
#[must_use]
pub fn avatar_initial(username: &str) -> String {
    username
        .chars()
        .next()
        .map(|c| c.to_uppercase().to_string())
        .unwrap_or_else(|| "?".to_string())
}
