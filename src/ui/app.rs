//! Page assembly: document shell, application header, and the two pages.

use chrono::{DateTime, Utc};
use leptos::prelude::*;
use uuid::Uuid;

use crate::backend::models::{Message, PresenceEntry, Room};
use crate::chat::{DirectorySnapshot, Notice};
use crate::identity::CurrentUser;
use crate::ui::chat::{CreateRoomControl, NoticeBanner, RoomList, RoomView};
use crate::ui::components::{
    Button, ButtonSize, ButtonVariant, Card, CardContent, CardHeader, LogOutIcon, ScrollArea,
};

/// Generate the HTML document shell around rendered page content.
fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en" class="dark">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Realtime chat rooms">
    <title>{title} - Huddle</title>

    <!-- HTMX and Extensions (local) -->
    <script src="/static/vendor/htmx-2.0.8.min.js"></script>
    <script src="/static/vendor/htmx-sse.js"></script>
    <script defer src="/static/vendor/alpine.min.js"></script>

    <link rel="stylesheet" href="/static/app.css">
</head>
<body class="min-h-screen bg-background text-textPrimary antialiased">
    <div id="app-shell" class="flex flex-col h-screen overflow-hidden">
        {content}
    </div>
</body>
</html>"#
    )
}

/// Application header: brand, selected-room breadcrumb, identity, sign-out.
#[component]
fn AppHeader(
    /// The signed-in identity.
    user: CurrentUser,
    /// Name of the selected room, shown as a breadcrumb.
    #[prop(default = None)]
    room_name: Option<String>,
) -> impl IntoView {
    let welcome = format!("Welcome, {}", user.username);

    view! {
        <header class="border-b border-panelBorder px-4 py-3 flex items-center justify-between bg-panel shrink-0">
            <div class="flex items-center gap-4">
                <a href="/" class="text-xl font-semibold hover:opacity-80" hx-boost="true">
                    "Huddle"
                </a>
                {room_name.map(|name| view! {
                    <span class="text-textMuted">"/ " {name}</span>
                })}
            </div>
            <div class="flex items-center gap-2">
                <span class="text-sm text-textMuted">{welcome}</span>
                <form method="post" action="/signout">
                    <Button button_type="submit" variant=ButtonVariant::Outline size=ButtonSize::Sm>
                        <LogOutIcon />
                        "Sign Out"
                    </Button>
                </form>
            </div>
        </header>
    }
}

/// Room directory sidebar: heading, create control, live room list.
///
/// The list subscribes to the directory relay; every room-collection change
/// re-renders it wholesale.
#[component]
fn Sidebar(
    /// Directory state to render.
    directory: DirectorySnapshot,
    /// The selected room, highlighted in the list.
    #[prop(default = None)]
    selected: Option<Uuid>,
) -> impl IntoView {
    let events_url = match selected {
        Some(id) => format!("/events?selected={id}"),
        None => "/events".to_string(),
    };
    let DirectorySnapshot {
        rooms,
        loaded,
        notice,
    } = directory;

    view! {
        <div class="w-80 border-r border-panelBorder bg-panel/30 p-4 flex flex-col shrink-0">
            <div class="flex items-center justify-between mb-4">
                <h2 class="font-semibold">"Chat Rooms"</h2>
                <CreateRoomControl />
            </div>

            <div id="directory-notices" class="mb-2">
                {notice.map(|notice| view! { <NoticeBanner notice=notice /> })}
            </div>

            <ScrollArea class="flex-1">
                <div hx-ext="sse" sse-connect=events_url>
                    <div id="room-list" sse-swap="rooms" hx-swap="innerHTML">
                        {if loaded {
                            view! { <RoomList rooms=rooms selected=selected /> }.into_any()
                        } else {
                            view! {
                                <p class="text-textMuted text-sm text-center py-8">"Loading..."</p>
                            }
                            .into_any()
                        }}
                    </div>
                </div>
            </ScrollArea>
        </div>
    }
}

/// The directory page: sidebar plus the no-room-selected panel.
pub fn index_page(user: &CurrentUser, directory: DirectorySnapshot) -> String {
    let content = view! {
        <AppHeader user=user.clone() />
        <div class="flex flex-1 min-h-0">
            <Sidebar directory=directory />
            <div class="flex-1 flex items-center justify-center">
                <div class="text-center">
                    <h3 class="text-lg font-semibold mb-2">"No room selected"</h3>
                    <p class="text-textMuted">
                        "Choose a room from the sidebar to start chatting"
                    </p>
                </div>
            </div>
        </div>
    }
    .to_html();

    html_shell("Rooms", &content)
}

/// The room detail page: sidebar plus the mounted room view.
#[allow(clippy::too_many_arguments)]
pub fn room_page(
    user: &CurrentUser,
    room: &Room,
    directory: DirectorySnapshot,
    messages: Vec<Message>,
    online: Vec<PresenceEntry>,
    notice: Option<Notice>,
    now: DateTime<Utc>,
) -> String {
    let user = user.clone();
    let room = room.clone();
    let title = room.name.clone();
    let room_name = room.name.clone();
    let selected = Some(room.id);

    let content = view! {
        <AppHeader user=user.clone() room_name=Some(room_name) />
        <div class="flex flex-1 min-h-0">
            <Sidebar directory=directory selected=selected />
            <div class="flex-1 min-w-0">
                <RoomView
                    room=room
                    user=user
                    messages=messages
                    online=online
                    notice=notice
                    now=now
                />
            </div>
        </div>
    }
    .to_html();

    html_shell(&title, &content)
}

/// Shown when no valid access token accompanies the request.
///
/// Sign-in itself happens on the platform's hosted auth pages; this app only
/// consumes the resulting token.
pub fn signed_out_page() -> String {
    let content = view! {
        <div class="flex-1 flex items-center justify-center">
            <Card class="max-w-md">
                <CardHeader>
                    <h1 class="text-xl font-semibold">"Signed out"</h1>
                </CardHeader>
                <CardContent class="space-y-2">
                    <p class="text-sm text-textMuted">
                        "Huddle needs an access token from your identity provider. \
                         Sign in through your provider, then return here with the \
                         access_token cookie set."
                    </p>
                </CardContent>
            </Card>
        </div>
    }
    .to_html();

    html_shell("Signed out", &content)
}
