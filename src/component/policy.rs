//! Permission predicates supplied by the host.
//!
//! Every predicate defaults to permitting everything. A predicate that
//! returns false turns the corresponding event into a silent no-op.

use std::fmt;

use crossterm::event::KeyEvent;

use super::input::InputEvent;
use crate::editor::Editor;

type InputPredicate = Box<dyn Fn(&Editor, &InputEvent) -> bool>;
type EditorPredicate = Box<dyn Fn(&Editor) -> bool>;
type KeyPredicate = Box<dyn Fn(&Editor, &KeyEvent) -> bool>;

pub struct Policy {
    is_editable: InputPredicate,
    can_be_formatted: EditorPredicate,
    can_copy: EditorPredicate,
    can_key_down: KeyPredicate,
}

impl Default for Policy {
    fn default() -> Self {
        Self::permit_all()
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy").finish_non_exhaustive()
    }
}

impl Policy {
    pub fn permit_all() -> Self {
        Self {
            is_editable: Box::new(|_, _| true),
            can_be_formatted: Box::new(|_| true),
            can_copy: Box::new(|_| true),
            can_key_down: Box::new(|_, _| true),
        }
    }

    /// Decides whether an input event may mutate the document.
    #[must_use]
    pub fn with_is_editable(mut self, predicate: impl Fn(&Editor, &InputEvent) -> bool + 'static) -> Self {
        self.is_editable = Box::new(predicate);
        self
    }

    /// Decides whether formatting hotkeys may run.
    #[must_use]
    pub fn with_can_be_formatted(mut self, predicate: impl Fn(&Editor) -> bool + 'static) -> Self {
        self.can_be_formatted = Box::new(predicate);
        self
    }

    /// Decides whether copy and cut may touch the clipboard.
    #[must_use]
    pub fn with_can_copy(mut self, predicate: impl Fn(&Editor) -> bool + 'static) -> Self {
        self.can_copy = Box::new(predicate);
        self
    }

    /// Decides whether a key press is processed at all.
    #[must_use]
    pub fn with_can_key_down(mut self, predicate: impl Fn(&Editor, &KeyEvent) -> bool + 'static) -> Self {
        self.can_key_down = Box::new(predicate);
        self
    }

    pub fn is_editable(&self, editor: &Editor, input: &InputEvent) -> bool {
        (self.is_editable)(editor, input)
    }

    pub fn can_be_formatted(&self, editor: &Editor) -> bool {
        (self.can_be_formatted)(editor)
    }

    pub fn can_copy(&self, editor: &Editor) -> bool {
        (self.can_copy)(editor)
    }

    pub fn can_key_down(&self, editor: &Editor, key: &KeyEvent) -> bool {
        (self.can_key_down)(editor, key)
    }
}
