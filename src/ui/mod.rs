//! Terminal UI components.
//!
//! - [`render`]: document layout, wrapping and hit-testing
//! - [`toolbar`]: formatting buttons
//! - [`overlays`]: link and image prompts
//! - [`style`]: theming and colors

pub mod overlays;
pub mod render;
pub mod style;
pub mod toolbar;

mod status;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};

use crate::app::Model;

/// Split the screen into the editor and the bottom bar.
pub fn split_main_rows(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(area)
}

/// Draw the whole application: the editor component, then the status bar
/// or a pending toast in the last row.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let [body, bar] = split_main_rows(frame.area());
    model.editor.render(frame, body);
    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, bar);
    } else {
        status::render_status_bar(model, frame, bar);
    }
}
