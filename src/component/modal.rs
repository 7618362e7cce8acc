//! Link and image prompts.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkField {
    Text,
    Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkPrompt {
    pub text: String,
    pub url: String,
    pub field: LinkField,
    /// Editing the link under the cursor rather than creating one.
    pub editing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modal {
    Link(LinkPrompt),
    Image { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalOutcome {
    Pending,
    Submit,
    Cancel,
}

impl Modal {
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Link(LinkPrompt { editing: true, .. }) => "Edit Link",
            Self::Link(_) => "Insert Link",
            Self::Image { .. } => "Insert Image",
        }
    }

    fn focused_mut(&mut self) -> &mut String {
        match self {
            Self::Link(prompt) => match prompt.field {
                LinkField::Text => &mut prompt.text,
                LinkField::Url => &mut prompt.url,
            },
            Self::Image { url } => url,
        }
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> ModalOutcome {
        match key.code {
            KeyCode::Esc => return ModalOutcome::Cancel,
            KeyCode::Enter => return ModalOutcome::Submit,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                if let Self::Link(prompt) = self {
                    prompt.field = match prompt.field {
                        LinkField::Text => LinkField::Url,
                        LinkField::Url => LinkField::Text,
                    };
                }
            }
            KeyCode::Backspace => {
                self.focused_mut().pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.focused_mut().clear();
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER) =>
            {
                self.focused_mut().push(c);
            }
            _ => {}
        }
        ModalOutcome::Pending
    }

    /// Pasted text goes into the focused field, minus line breaks.
    pub fn paste(&mut self, text: &str) {
        self.focused_mut()
            .extend(text.chars().filter(|c| *c != '\n' && *c != '\r'));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(modal: &mut Modal, code: KeyCode) -> ModalOutcome {
        modal.handle_key(&KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn link_prompt() -> Modal {
        Modal::Link(LinkPrompt {
            text: "docs".into(),
            url: String::new(),
            field: LinkField::Url,
            editing: false,
        })
    }

    #[test]
    fn test_typing_fills_focused_field() {
        let mut modal = link_prompt();
        for c in "a.io".chars() {
            assert_eq!(press(&mut modal, KeyCode::Char(c)), ModalOutcome::Pending);
        }
        press(&mut modal, KeyCode::Backspace);
        press(&mut modal, KeyCode::Tab);
        press(&mut modal, KeyCode::Char('!'));
        let Modal::Link(prompt) = &modal else {
            unreachable!()
        };
        assert_eq!(prompt.url, "a.i");
        assert_eq!(prompt.text, "docs!");
    }

    #[test]
    fn test_enter_submits_and_escape_cancels() {
        let mut modal = Modal::Image { url: String::new() };
        modal.paste("https://x.io/a.png\n");
        assert_eq!(modal, Modal::Image { url: "https://x.io/a.png".into() });
        assert_eq!(press(&mut modal, KeyCode::Enter), ModalOutcome::Submit);
        assert_eq!(press(&mut modal, KeyCode::Esc), ModalOutcome::Cancel);
        assert_eq!(modal.title(), "Insert Image");
    }
}
