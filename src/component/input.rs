//! Input events: the document-mutating intent behind a key press.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::editor::DataTransfer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    InsertText(String),
    /// Soft break inside the current block.
    InsertLineBreak,
    /// Split the current block.
    InsertParagraph,
    InsertFromPaste(DataTransfer),
    InsertFromDrop(DataTransfer),
    DeleteContentBackward,
    DeleteContentForward,
    DeleteWordBackward,
    DeleteByCut,
}

impl InputEvent {
    /// The input a plain key press produces, if any. Keys held with Ctrl,
    /// Alt or Super are not text input, except Alt/Ctrl+Backspace.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        let chorded = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER);
        match key.code {
            KeyCode::Backspace if chorded => Some(Self::DeleteWordBackward),
            KeyCode::Backspace => Some(Self::DeleteContentBackward),
            KeyCode::Delete if !chorded => Some(Self::DeleteContentForward),
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => Some(Self::InsertLineBreak),
            KeyCode::Enter if !chorded => Some(Self::InsertParagraph),
            KeyCode::Char(c) if !chorded => Some(Self::InsertText(c.to_string())),
            _ => None,
        }
    }

    /// The DOM-style input type name, for logs and host predicates.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::InsertText(_) => "insertText",
            Self::InsertLineBreak => "insertLineBreak",
            Self::InsertParagraph => "insertParagraph",
            Self::InsertFromPaste(_) => "insertFromPaste",
            Self::InsertFromDrop(_) => "insertFromDrop",
            Self::DeleteContentBackward => "deleteContentBackward",
            Self::DeleteContentForward => "deleteContentForward",
            Self::DeleteWordBackward => "deleteWordBackward",
            Self::DeleteByCut => "deleteByCut",
        }
    }

    pub const fn is_deletion(&self) -> bool {
        matches!(
            self,
            Self::DeleteContentBackward
                | Self::DeleteContentForward
                | Self::DeleteWordBackward
                | Self::DeleteByCut
        )
    }
}

/// What the component did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Consumed; the default action was replaced by the editor's.
    Handled,
    /// Denied by a policy or the read-only flag; nothing happened.
    Prevented,
    /// Not an editor event; the host may handle it.
    Ignored,
}

impl EventOutcome {
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Handled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_plain_chars_become_text() {
        assert_eq!(
            InputEvent::from_key(&key(KeyCode::Char('A'), KeyModifiers::SHIFT)),
            Some(InputEvent::InsertText("A".into()))
        );
        assert_eq!(InputEvent::from_key(&key(KeyCode::Char('a'), KeyModifiers::CONTROL)), None);
    }

    #[test]
    fn test_enter_and_backspace_variants() {
        assert_eq!(
            InputEvent::from_key(&key(KeyCode::Enter, KeyModifiers::NONE)),
            Some(InputEvent::InsertParagraph)
        );
        assert_eq!(
            InputEvent::from_key(&key(KeyCode::Enter, KeyModifiers::SHIFT)),
            Some(InputEvent::InsertLineBreak)
        );
        assert_eq!(
            InputEvent::from_key(&key(KeyCode::Backspace, KeyModifiers::ALT)),
            Some(InputEvent::DeleteWordBackward)
        );
        assert_eq!(InputEvent::from_key(&key(KeyCode::Up, KeyModifiers::NONE)), None);
    }
}
