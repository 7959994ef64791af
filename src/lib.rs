//! Huddle
//!
//! A chat-rooms front-end whose persistence, identity and realtime fan-out
//! live on a managed backend platform. This crate only reconciles local view
//! state with the platform's push notifications and renders it, HTML-first.
//!
//! # Architecture
//!
//! - **Backend access**: injected [`backend::ChatBackend`] capability over
//!   the platform's REST/SSE/auth APIs
//! - **View state**: [`chat::RoomDirectory`] and [`chat::RoomSession`]
//!   mirror rooms, messages and presence
//! - **Server**: Axum pages, HTMX fragments and SSE relays
//! - **UI**: Leptos SSR + HTMX + Alpine
//!
//! # Modules
//!
//! - [`backend`]: managed-backend client
//! - [`chat`]: view-state reconciliation
//! - [`identity`]: current-user shaping
//! - [`server`]: HTTP surface
//! - [`session`]: per-browser UI sessions
//! - [`ui`]: rendering

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::default_trait_access)]
#![allow(clippy::unused_async)]

pub mod backend;
pub mod chat;
pub mod config;
pub mod identity;
pub mod server;
pub mod session;
pub mod ui;

use std::sync::Arc;

use backend::ChatBackend;
use chat::RoomDirectory;
use config::AppConfig;
use session::SessionStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The managed-backend client.
    pub backend: Arc<dyn ChatBackend>,
    /// The app-wide room directory.
    pub directory: Arc<RoomDirectory>,
    /// Per-browser UI sessions.
    pub sessions: SessionStore,
    /// Global configuration.
    pub config: Arc<AppConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}
