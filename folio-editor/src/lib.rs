//! Admin editor for the portfolio content service.
//!
//! [`state::EditorState`] is the in-memory mirror of the content document
//! with per-section dirty tracking. [`editor::Editor`] pairs it with a
//! [`client::ContentApi`] to load and save. The server only replaces whole
//! documents, so every save, even of a single section, sends the full mirror.
pub mod client;
pub mod editor;
pub mod state;

pub use client::{ApiError, ContentApi, HttpContentApi};
pub use editor::{Editor, Notification, NotificationKind};
pub use state::{Direction, EditError, EditorState, ListPath};
