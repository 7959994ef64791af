//! UI components and layouts.
//!
//! This module provides Leptos SSR components for rendering the application,
//! following ShadCN-UI design principles. Pages are rendered to strings on
//! the server; interactivity comes from HTMX (with its SSE extension) and
//! Alpine, served as static vendor scripts.
//!
//! # Structure
//!
//! - [`app`]: document shell and page assembly
//! - [`chat`]: the chat views (room list, room detail, presence, dialogs)
//! - [`components`]: reusable ShadCN-style UI components

pub mod app;
pub mod chat;
pub mod components;
