// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. editor::EditorId)
    clippy::module_name_repetitions
)]

//! # markwright
//!
//! A rich-text markdown editor component for the terminal.
//!
//! markwright edits a structured document (paragraphs, headings, lists,
//! quotes, code, links, images and named clauses) and keeps it convertible
//! to and from markdown and HTML:
//! - Keyboard shortcuts for marks and blocks, with host-supplied policies
//! - Copy and cut as markdown plus HTML
//! - Paste of HTML, markdown, URLs and image links
//! - Drag-and-drop of clause blocks
//!
//! ## Modules
//!
//! - [`document`]: Node tree, locations, markdown and HTML conversion
//! - [`editor`]: Editing engine and plugins
//! - [`component`]: The [`MarkdownEditor`](component::MarkdownEditor)
//! - [`ui`]: Terminal rendering
//! - [`app`]: Standalone terminal editor built on the component
//! - [`config`]: Saved command-line defaults

pub mod app;
pub mod component;
pub mod config;
pub mod document;
pub mod editor;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::component::{EventOutcome, HotkeyTable, MarkdownEditor, MatchMode, Policy};
    pub use crate::document::{Value, markdown_to_value, value_to_markdown};
    pub use crate::editor::{Editor, build_editor};
}
