//! Terminal host application for the editor component.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: State transitions
//! - [`App::run`]: Main event loop with rendering

mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Model, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::component::MatchMode;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    file_path: PathBuf,
    read_only: bool,
    placeholder: Option<String>,
    match_mode: MatchMode,
    system_clipboard: bool,
}

impl App {
    /// Create a new application for the given file.
    pub fn new(file_path: PathBuf) -> Self {
        Self {
            file_path,
            read_only: false,
            placeholder: None,
            match_mode: MatchMode::default(),
            system_clipboard: true,
        }
    }

    /// Open the document without allowing edits.
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Hint shown while the document is empty.
    pub fn with_placeholder(mut self, placeholder: Option<String>) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// How many hotkey bindings fire for one key press.
    pub const fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    /// Use the OS clipboard when available, else the terminal (OSC 52).
    pub const fn with_system_clipboard(mut self, enabled: bool) -> Self {
        self.system_clipboard = enabled;
        self
    }
}

#[cfg(test)]
mod tests;
