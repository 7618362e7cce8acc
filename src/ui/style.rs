//! Theming and color definitions.
//!
//! Uses ANSI colors so the editor follows the terminal's palette.

use ratatui::style::{Color, Modifier, Style};

use crate::document::{ElementKind, Marks};

/// Theme configuration for the editor surface and its chrome.
#[derive(Debug, Clone)]
pub struct Theme {
    pub h1: Style,
    pub h2: Style,
    pub h3: Style,
    /// Heading level 4+ style
    pub h4: Style,
    pub code_block: Style,
    pub inline_code: Style,
    pub quote: Style,
    pub link: Style,
    pub list_marker: Style,
    pub image: Style,
    pub rule: Style,
    /// Clause fences and their drag handle
    pub clause: Style,
    pub placeholder: Style,
    pub selection: Style,
    pub toolbar: Style,
    pub toolbar_disabled: Style,
    pub status_bg: Color,
    pub status_fg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            h1: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            h2: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            h3: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            h4: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            code_block: Style::default().fg(Color::Indexed(245)),
            inline_code: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            quote: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::ITALIC),
            link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            list_marker: Style::default().fg(Color::Yellow),
            image: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),
            rule: Style::default()
                .fg(Color::Indexed(240))
                .add_modifier(Modifier::DIM),
            clause: Style::default().fg(Color::Indexed(244)),
            placeholder: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            selection: Style::default().add_modifier(Modifier::REVERSED),
            toolbar: Style::default().fg(Color::Gray),
            toolbar_disabled: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::DIM),
            status_bg: Color::DarkGray,
            status_fg: Color::White,
        }
    }
}

impl Theme {
    /// Default style for the active state of toolbar buttons.
    pub fn active_button() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    }

    /// Base style for the text of a block of `kind`.
    pub fn block(&self, kind: &ElementKind) -> Style {
        match kind {
            ElementKind::Heading { level: 1 } => self.h1,
            ElementKind::Heading { level: 2 } => self.h2,
            ElementKind::Heading { level: 3 } => self.h3,
            ElementKind::Heading { .. } => self.h4,
            ElementKind::CodeBlock { .. } => self.code_block,
            ElementKind::Image { .. } => self.image,
            ElementKind::HorizontalRule => self.rule,
            _ => Style::default(),
        }
    }

    /// Leaf style: `base` with the marks layered on.
    pub fn marks(&self, base: Style, marks: Marks, in_link: bool) -> Style {
        let mut style = base;
        if in_link {
            style = style.patch(self.link);
        }
        if marks.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if marks.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if marks.strikethrough {
            style = style.add_modifier(Modifier::CROSSED_OUT);
        }
        if marks.code {
            style = style.patch(self.inline_code);
        }
        style
    }
}
