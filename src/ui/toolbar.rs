//! Formatting toolbar.

use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use super::style::Theme;
use crate::component::HotkeyAction;
use crate::document::Mark;
use crate::editor::{BlockFormat, Editor, is_block_active, is_link_active, is_mark_active};

pub struct ToolbarButton {
    pub label: &'static str,
    pub action: HotkeyAction,
}

pub const BUTTONS: &[ToolbarButton] = &[
    ToolbarButton { label: "B", action: HotkeyAction::Mark(Mark::Bold) },
    ToolbarButton { label: "I", action: HotkeyAction::Mark(Mark::Italic) },
    ToolbarButton { label: "`", action: HotkeyAction::Mark(Mark::Code) },
    ToolbarButton { label: "S", action: HotkeyAction::Mark(Mark::Strikethrough) },
    ToolbarButton { label: "H1", action: HotkeyAction::Block(BlockFormat::Heading(1)) },
    ToolbarButton { label: "H2", action: HotkeyAction::Block(BlockFormat::Heading(2)) },
    ToolbarButton { label: "H3", action: HotkeyAction::Block(BlockFormat::Heading(3)) },
    ToolbarButton { label: ">", action: HotkeyAction::Block(BlockFormat::BlockQuote) },
    ToolbarButton { label: "•", action: HotkeyAction::Block(BlockFormat::BulletedList) },
    ToolbarButton { label: "1.", action: HotkeyAction::Block(BlockFormat::NumberedList) },
    ToolbarButton { label: "{}", action: HotkeyAction::Block(BlockFormat::CodeBlock) },
    ToolbarButton { label: "link", action: HotkeyAction::Link },
    ToolbarButton { label: "img", action: HotkeyAction::Image },
    ToolbarButton { label: "undo", action: HotkeyAction::Undo },
    ToolbarButton { label: "redo", action: HotkeyAction::Redo },
];

/// Column span of a drawn button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolbarHit {
    pub x: u16,
    pub width: u16,
    pub action: HotkeyAction,
}

fn is_active(editor: &Editor, action: HotkeyAction) -> bool {
    match action {
        HotkeyAction::Mark(mark) => is_mark_active(editor, mark),
        HotkeyAction::Block(format) => is_block_active(editor, format),
        HotkeyAction::Link => is_link_active(editor),
        HotkeyAction::Image | HotkeyAction::Undo | HotkeyAction::Redo => false,
    }
}

fn is_enabled(editor: &Editor, action: HotkeyAction, can_format: bool) -> bool {
    match action {
        HotkeyAction::Undo => editor.can_undo(),
        HotkeyAction::Redo => editor.can_redo(),
        _ => can_format,
    }
}

/// Draw the toolbar and return where each button landed.
pub fn render_toolbar(
    frame: &mut Frame,
    area: Rect,
    editor: &Editor,
    theme: &Theme,
    active_button: Style,
    can_format: bool,
) -> Vec<ToolbarHit> {
    let mut spans = Vec::with_capacity(BUTTONS.len() * 2);
    let mut hits = Vec::with_capacity(BUTTONS.len());
    let mut x = area.x;
    for (idx, button) in BUTTONS.iter().enumerate() {
        // Group separators before headings, links and history.
        if idx > 0 {
            let gap = if matches!(idx, 4 | 11 | 13) { " │ " } else { " " };
            spans.push(Span::styled(gap, theme.toolbar_disabled));
            x += u16::try_from(gap.chars().count()).unwrap_or(1);
        }
        let label = format!("[{}]", button.label);
        let width = u16::try_from(label.chars().count()).unwrap_or(u16::MAX);
        let style = if !is_enabled(editor, button.action, can_format) {
            theme.toolbar_disabled
        } else if is_active(editor, button.action) {
            active_button
        } else {
            theme.toolbar
        };
        spans.push(Span::styled(label, style));
        hits.push(ToolbarHit {
            x,
            width,
            action: button.action,
        });
        x = x.saturating_add(width);
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
    hits
}

pub fn hit_button(hits: &[ToolbarHit], col: u16) -> Option<HotkeyAction> {
    hits.iter()
        .find(|hit| col >= hit.x && col < hit.x + hit.width)
        .map(|hit| hit.action)
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::document::markdown_to_value;
    use crate::editor::build_editor;

    fn draw(editor: &Editor, can_format: bool) -> (Vec<ToolbarHit>, ratatui::buffer::Buffer) {
        let mut terminal = Terminal::new(TestBackend::new(100, 1)).unwrap();
        let mut hits = Vec::new();
        terminal
            .draw(|frame| {
                hits = render_toolbar(
                    frame,
                    frame.area(),
                    editor,
                    &Theme::default(),
                    Theme::active_button(),
                    can_format,
                );
            })
            .unwrap();
        (hits, terminal.backend().buffer().clone())
    }

    #[test]
    fn test_buttons_are_hit_testable() {
        let editor = build_editor(None);
        let (hits, buffer) = draw(&editor, true);
        assert_eq!(hits.len(), BUTTONS.len());
        assert_eq!(buffer[(0, 0)].symbol(), "[");
        assert_eq!(buffer[(1, 0)].symbol(), "B");
        assert_eq!(hit_button(&hits, 1), Some(HotkeyAction::Mark(Mark::Bold)));
        assert_eq!(hit_button(&hits, 3), None);
        let redo = hits.last().unwrap();
        assert_eq!(hit_button(&hits, redo.x), Some(HotkeyAction::Redo));
    }

    #[test]
    fn test_active_marks_use_active_style() {
        let mut editor = build_editor(None);
        editor.reset(markdown_to_value("**bold**"));
        editor.select_block_position(0, 2, false);
        let (_, buffer) = draw(&editor, true);
        assert_eq!(buffer[(1, 0)].bg, Color::Cyan);
        assert_ne!(buffer[(5, 0)].bg, Color::Cyan);
    }

    #[test]
    fn test_denied_formatting_dims_buttons() {
        let editor = build_editor(None);
        let (_, buffer) = draw(&editor, false);
        assert!(buffer[(1, 0)].modifier.contains(Modifier::DIM));
    }
}
