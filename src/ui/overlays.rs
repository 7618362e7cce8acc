use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph};

use crate::component::{LinkField, Modal};

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}

fn field_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Indexed(245))
    };
    let cursor = if focused { "▏" } else { "" };
    Line::from(vec![
        Span::styled(format!("{label:>5}: "), label_style),
        Span::raw(value.to_string()),
        Span::styled(cursor, Style::default().fg(Color::Yellow)),
    ])
}

pub fn render_modal_overlay(modal: &Modal, frame: &mut Frame, area: Rect) {
    let mut lines = Vec::new();
    match modal {
        Modal::Link(prompt) => {
            lines.push(field_line("Text", &prompt.text, prompt.field == LinkField::Text));
            lines.push(field_line("URL", &prompt.url, prompt.field == LinkField::Url));
        }
        Modal::Image { url } => lines.push(field_line("URL", url, true)),
    }
    lines.push(Line::raw(" "));
    lines.push(Line::styled(
        "Enter apply · Tab switch field · Esc cancel",
        Style::default().fg(Color::Indexed(245)),
    ));

    let popup_width = area.width.saturating_sub(16).max(44);
    #[allow(clippy::cast_possible_truncation)]
    let popup_height = lines.len() as u16 + 4;
    let popup = centered_popup_rect(popup_width, popup_height, area);
    let block = Block::default()
        .title(modal.title())
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Color::Black).fg(Color::White));
    frame.render_widget(Clear, popup);
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

#[cfg(test)]
mod tests {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::component::LinkPrompt;

    fn buffer_text(buffer: &ratatui::buffer::Buffer) -> String {
        let area = buffer.area;
        (area.y..area.y + area.height)
            .map(|y| {
                (area.x..area.x + area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_link_modal_shows_both_fields() {
        let modal = Modal::Link(LinkPrompt {
            text: "docs".into(),
            url: "https://example.com".into(),
            field: LinkField::Url,
            editing: true,
        });
        let mut terminal = Terminal::new(TestBackend::new(70, 12)).unwrap();
        terminal
            .draw(|frame| render_modal_overlay(&modal, frame, frame.area()))
            .unwrap();
        let text = buffer_text(terminal.backend().buffer());
        assert!(text.contains("Edit Link"));
        assert!(text.contains("Text: docs"));
        assert!(text.contains("URL: https://example.com"));
    }
}
