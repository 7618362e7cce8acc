//! Undo/redo layer.

use super::{Flow, Plugin};
use crate::editor::Editor;

pub struct HistoryPlugin;

impl Plugin for HistoryPlugin {
    fn name(&self) -> &'static str {
        "history"
    }

    fn undo(&self, editor: &mut Editor) -> Flow {
        if !editor.apply_undo() {
            tracing::trace!(editor = %editor.id(), "nothing to undo");
        }
        Flow::Handled
    }

    fn redo(&self, editor: &mut Editor) -> Flow {
        if !editor.apply_redo() {
            tracing::trace!(editor = %editor.id(), "nothing to redo");
        }
        Flow::Handled
    }
}

/// Record every transaction so it can be undone.
pub fn with_history(mut editor: Editor) -> Editor {
    editor.enable_history();
    editor.register(HistoryPlugin)
}
