use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let filename = model
        .file_path
        .file_name()
        .map_or_else(|| "untitled".to_string(), |s| s.to_string_lossy().to_string());

    let editor = model.editor.editor();
    let position = editor
        .focus_position()
        .map(|(block, offset)| format!("Block {}:{}", block + 1, offset + 1))
        .unwrap_or_default();
    let dirty = if model.is_dirty() { " [+]" } else { "" };
    let mode = if model.editor.is_read_only() {
        " [read-only]"
    } else {
        ""
    };

    let status = format!(" {filename}{dirty}{mode}  {position}  ^S:save ^Q:quit");
    let theme = crate::ui::style::Theme::default();
    let status_bar =
        Paragraph::new(status).style(Style::default().bg(theme.status_bg).fg(theme.status_fg));
    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
