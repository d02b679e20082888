//! Holds the complete in-memory state for one open document.
//!
//! - [`document::Document`] owns the piece table, line index, cursors and
//!   undo history, and runs every edit through one batch protocol.
//! - [`config::EditorConfig`] carries the per-document settings.
//!
//! The editing, navigation, find/replace, line and rectangular operations
//! are all methods on [`document::Document`], split across private modules.

pub mod config;
pub mod document;

mod edit;
mod find;
mod lines;
mod navigation;
mod rect;
