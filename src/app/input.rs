use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;

use crate::app::{App, Message, Model};

impl App {
    pub(super) fn handle_event(event: Event) -> Option<Message> {
        match event {
            Event::Key(key) => Self::handle_key(key),
            Event::Mouse(mouse) => Some(Message::Mouse(mouse)),
            Event::Paste(text) => Some(Message::Paste(text)),
            Event::Resize(w, h) => Some(Message::Resize(w, h)),
            _ => None,
        }
    }

    /// Application keys first; everything else goes to the editor.
    pub(super) fn handle_key(key: KeyEvent) -> Option<Message> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('s') => return Some(Message::Save),
                KeyCode::Char('q') => return Some(Message::Quit),
                _ => {}
            }
        }
        Some(Message::Key(key))
    }

    pub(super) fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}
