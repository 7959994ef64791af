//! ShadCN-style reusable UI components.
//!
//! This module provides a set of composable, accessible UI components
//! inspired by shadcn/ui, rendered via Leptos SSR.
//!
//! # Components
//!
//! - [`Avatar`]: initial-letter avatar with online indicator
//! - [`Badge`]: status badge/tag
//! - [`Button`]: clickable button with variants
//! - [`Card`], [`CardHeader`], [`CardContent`]: card container
//! - [`Dialog`]: modal dialog
//! - [`ScrollArea`]: scrollable container
//! - [`icons`]: SVG icon components
//!
//! Form fields carry Alpine bindings (`x-model`, `x-bind:disabled`) and are
//! written as plain elements where those bindings are needed.

mod avatar;
mod badge;
mod button;
mod card;
mod dialog;
mod icons;
mod scroll_area;

pub use avatar::{Avatar, avatar_initial};
pub use badge::{Badge, BadgeVariant};
pub use button::{Button, ButtonSize, ButtonVariant};
pub use card::{Card, CardContent, CardHeader};
pub use dialog::Dialog;
pub use icons::*;
pub use scroll_area::ScrollArea;
