//! Axum server: pages, HTMX fragment endpoints, and SSE relays.
//!
//! Pages are rendered server-side from view-state snapshots; liveness is
//! delivered by relaying room and directory events to the browser as
//! server-sent events carrying re-rendered fragments (HTMX `sse-swap`).

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use futures::{Stream, StreamExt};
use leptos::prelude::*;
use serde::Deserialize;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::backend::models::Message;
use crate::chat::{CreateRoomError, Notice, RoomEvent, RoomSession, SendError};
use crate::identity::CurrentUser;
use crate::session::UiSession;
use crate::ui::app::{index_page, room_page, signed_out_page};
use crate::ui::chat::{
    MessageRow, NoticeBanner, OnlineUsers, RoomList, online_count_label, starts_group,
};

/// Session cookie carrying the UI session id.
const SESSION_COOKIE: &str = "huddle_session";

/// Cookie carrying the platform access token.
const TOKEN_COOKIE: &str = "access_token";

/// Start the server with the provided state.
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let config = Arc::clone(&state.config);
    spawn_session_sweeper(state.clone());

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router. Separate from [`start_server`] so tests can
/// drive it without binding a socket.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/rooms", post(create_room_handler))
        .route("/rooms/{id}", get(room_handler))
        .route("/rooms/{id}/messages", post(send_message_handler))
        .route("/rooms/{id}/events", get(room_events_handler))
        .route("/events", get(directory_events_handler))
        .route("/signout", post(signout_handler))
        .nest_service("/static", ServeDir::new("static"))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically close and forget idle UI sessions.
fn spawn_session_sweeper(state: AppState) {
    let timeout = Duration::from_secs(state.config.session.idle_timeout_minutes * 60);
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(60));
        loop {
            tick.tick().await;
            let expired = state.sessions.take_expired(timeout);
            for session in expired {
                tracing::debug!(session = %session.id(), "sweeping idle session");
                session.leave_room().await;
            }
        }
    });
}

/// Resolve the UI session for a request, creating one when only the access
/// token is present. Without a usable identity, answers the signed-out page.
async fn resolve_session(
    state: &AppState,
    jar: CookieJar,
) -> Result<(UiSession, CookieJar), Response> {
    if let Some(sid) = jar.get(SESSION_COOKIE) {
        if let Some(session) = state.sessions.get(sid.value()) {
            return Ok((session, jar));
        }
    }

    let Some(token) = jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()) else {
        return Err(Html(signed_out_page()).into_response());
    };

    match state.backend.current_user(&token).await {
        Ok(profile) => {
            let user = CurrentUser::from_profile(&profile);
            let session = state.sessions.create(user, token);
            let jar = jar.add(Cookie::new(SESSION_COOKIE, session.id().to_string()));
            Ok((session, jar))
        }
        Err(e) => {
            tracing::warn!(error = %e, "identity lookup failed");
            Err(Html(signed_out_page()).into_response())
        }
    }
}

/// GET `/` — the directory page with no room selected.
///
/// Arriving here is the "selected none" path: any mounted room is closed.
async fn index_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (session, jar) = match resolve_session(&state, jar).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    session.leave_room().await;

    let page = index_page(session.user(), state.directory.snapshot());
    (jar, Html(page)).into_response()
}

/// GET `/rooms/{id}` — the room detail page; mounts the room session.
async fn room_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Response {
    let (session, jar) = match resolve_session(&state, jar).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let Some(room) = state.directory.room(id) else {
        return Redirect::to("/").into_response();
    };

    // Reuse the mounted session when the selection did not change; a new
    // selection closes the previous room exactly once.
    let active = session.active_room().await;
    let room_session = match active {
        Some(active) if active.room().id == id && !active.is_closed() => active,
        _ => {
            let opened = Arc::new(
                RoomSession::open(
                    Arc::clone(&state.backend),
                    room.clone(),
                    session.user().clone(),
                )
                .await,
            );
            session.enter_room(opened).await
        }
    };

    let page = room_page(
        session.user(),
        &room,
        state.directory.snapshot(),
        room_session.messages(),
        room_session.online(),
        room_session.notice(),
        Utc::now(),
    );
    (jar, Html(page)).into_response()
}

#[derive(Debug, Deserialize)]
struct CreateRoomForm {
    name: String,
}

/// POST `/rooms` — create a room from the dialog form.
///
/// Success answers an `HX-Redirect` into the new room (optimistic
/// selection); failures answer a notice fragment for `#dialog-notices`,
/// leaving the dialog open with the attempted name.
async fn create_room_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    axum::extract::Form(form): axum::extract::Form<CreateRoomForm>,
) -> Response {
    let (session, jar) = match resolve_session(&state, jar).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    match state.directory.create_room(&form.name, session.user()).await {
        Ok(room) => {
            let target = format!("/rooms/{}", room.id);
            (jar, [("HX-Redirect", target)], "").into_response()
        }
        Err(CreateRoomError::DuplicateName) => {
            notice_fragment(jar, Notice::error("A room with this name already exists"))
        }
        Err(e @ (CreateRoomError::EmptyName | CreateRoomError::NameTooLong)) => {
            notice_fragment(jar, Notice::error(e.to_string()))
        }
        Err(CreateRoomError::Failed(_)) => {
            notice_fragment(jar, Notice::error("Failed to create room"))
        }
    }
}

#[derive(Debug, Deserialize)]
struct SendMessageForm {
    content: String,
}

/// POST `/rooms/{id}/messages` — send a message in the mounted room.
///
/// Success answers an empty body (the message arrives via the push relay);
/// failures answer a notice fragment and the browser keeps the draft. A
/// duplicate in-flight send is rejected without any visible surface.
async fn send_message_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    axum::extract::Form(form): axum::extract::Form<SendMessageForm>,
) -> Response {
    let (session, jar) = match resolve_session(&state, jar).await {
        Ok(resolved) => resolved,
        Err(response) => return response,
    };

    let Some(room_session) = session.active_room().await else {
        return notice_fragment(jar, Notice::error("This room is no longer open"));
    };
    if room_session.room().id != id {
        return notice_fragment(jar, Notice::error("This room is no longer open"));
    }

    match room_session.send(&form.content).await {
        Ok(()) | Err(SendError::Empty) => (StatusCode::OK, jar, "").into_response(),
        Err(SendError::InFlight) => (StatusCode::CONFLICT, jar, "").into_response(),
        Err(SendError::TooLong) => {
            notice_fragment(jar, Notice::error("Message is too long"))
        }
        Err(SendError::Failed(_)) => {
            notice_fragment(jar, Notice::error("Failed to send message"))
        }
    }
}

/// POST `/signout` — close the room, invalidate the token, forget the
/// session.
async fn signout_handler(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(sid) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) {
        if let Some(session) = state.sessions.remove(&sid) {
            session.leave_room().await;
            if let Err(e) = state.backend.sign_out(session.access_token()).await {
                tracing::warn!(error = %e, "sign-out call failed");
            }
        }
    }

    let jar = jar
        .remove(Cookie::from(SESSION_COOKIE))
        .remove(Cookie::from(TOKEN_COOKIE));
    (jar, Redirect::to("/")).into_response()
}

#[derive(Debug, Deserialize)]
struct DirectoryEventsQuery {
    selected: Option<Uuid>,
}

/// GET `/events` — relay directory revisions as re-rendered room lists.
async fn directory_events_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<DirectoryEventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    if resolve_session(&state, jar).await.is_err() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let directory = Arc::clone(&state.directory);
    let selected = query.selected;

    let stream = WatchStream::new(directory.revisions()).map(move |_| {
        let rooms = directory.rooms();
        let html = view! { <RoomList rooms=rooms selected=selected /> }.to_html();
        Ok(Event::default().event("rooms").data(html))
    });

    Ok(sse_response(stream))
}

/// GET `/rooms/{id}/events` — relay room events as rendered fragments.
///
/// `message` events carry one message row (appended by the browser, which
/// then scrolls to the latest entry); `presence` events carry the online
/// panel plus an out-of-band online-count update for the room header.
async fn room_events_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    let Ok((session, _)) = resolve_session(&state, jar).await else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let Some(room_session) = session.active_room().await else {
        return Err(StatusCode::NOT_FOUND);
    };
    if room_session.room().id != id {
        return Err(StatusCode::NOT_FOUND);
    }

    let events = room_session.events();
    let stream = BroadcastStream::new(events).filter_map(move |event| {
        let room_session = Arc::clone(&room_session);
        async move {
            match event {
                Ok(RoomEvent::Message(message)) => {
                    Some(Ok(render_message_event(&room_session, message)))
                }
                Ok(RoomEvent::Presence { online }) => {
                    let html = format!(
                        "{}<span id=\"online-count\" hx-swap-oob=\"true\" class=\"text-xs\">{}</span>",
                        view! { <OnlineUsers users=online.clone() /> }.to_html(),
                        online_count_label(online.len()),
                    );
                    Some(Ok(Event::default().event("presence").data(html)))
                }
                Err(e) => {
                    tracing::debug!(error = %e, "room event relay lagged");
                    None
                }
            }
        }
    });

    Ok(sse_response(stream))
}

/// Render one pushed message as an appendable row, with the header collapsed
/// when it continues the previous author's run.
fn render_message_event(room_session: &RoomSession, message: Message) -> Event {
    let messages = room_session.messages();
    let previous = messages
        .iter()
        .rposition(|m| m.id == message.id)
        .and_then(|pos| pos.checked_sub(1))
        .map(|pos| messages[pos].clone());
    let show_header = starts_group(previous.as_ref(), &message);
    let current_user = room_session.user().id;

    let html = view! {
        <MessageRow
            message=message
            show_header=show_header
            current_user=current_user
            now=Utc::now()
        />
    }
    .to_html();

    Event::default().event("message").data(html)
}

/// Notice fragment response for an HTMX swap target.
fn notice_fragment(jar: CookieJar, notice: Notice) -> Response {
    let html = view! { <NoticeBanner notice=notice /> }.to_html();
    (jar, Html(html)).into_response()
}

/// Wrap a fragment stream as an SSE response with keep-alives.
fn sse_response<S>(stream: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = Result<Event, Infallible>> + Send + 'static,
{
    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
