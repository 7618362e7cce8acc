//! List editing.
//!
//! Enter in an empty list item and Backspace at the start of a list item
//! both leave the list. Adjacent lists of the same type are merged.

use crate::document::path::{block_offset_of, element_at, parent};
use crate::document::{ElementKind, Node, Value};

use super::{Flow, Plugin};
use crate::editor::Editor;

pub struct ListsPlugin;

impl Plugin for ListsPlugin {
    fn name(&self) -> &'static str {
        "lists"
    }

    fn insert_break(&self, editor: &mut Editor) -> Flow {
        match current_item(editor) {
            Some((item, _)) if element_at(editor.value(), &item).is_some_and(|el| el.string().is_empty()) => {
                lift_item(editor, &item);
                Flow::Handled
            }
            _ => Flow::Continue,
        }
    }

    fn delete_backward(&self, editor: &mut Editor) -> Flow {
        match current_item(editor) {
            Some((item, 0)) => {
                lift_item(editor, &item);
                Flow::Handled
            }
            _ => Flow::Continue,
        }
    }

    fn normalize(&self, value: &mut Value) -> bool {
        merge_adjacent_lists(value)
    }
}

pub fn with_lists(editor: Editor) -> Editor {
    editor.register(ListsPlugin)
}

/// The list item holding a collapsed cursor, with the cursor's offset.
fn current_item(editor: &Editor) -> Option<(Vec<usize>, usize)> {
    let selection = editor.selection()?;
    if selection.is_expanded() {
        return None;
    }
    let (block, offset) = block_offset_of(editor.value(), &selection.focus)?;
    let el = element_at(editor.value(), &block)?;
    let in_list = element_at(editor.value(), &parent(&block)).is_some_and(|p| p.kind.is_list());
    (el.kind == ElementKind::ListItem && in_list).then_some((block, offset))
}

/// Move a list item out of its list. Out of a nested list it becomes an
/// item of the enclosing list, otherwise a paragraph.
fn lift_item(editor: &mut Editor, item: &[usize]) {
    let Some(captured) = editor.capture_selection() else {
        return;
    };
    tracing::trace!(editor = %editor.id(), ?item, "lift list item");
    let Some(lifted) = editor.lift_node(item) else {
        return;
    };
    let parent_is_list = element_at(editor.value(), &parent(&lifted)).is_some_and(|p| p.kind.is_list());
    if !parent_is_list {
        editor.set_kind(&lifted, ElementKind::Paragraph);
    }
    editor.restore_selection(captured);
}

fn merge_adjacent_lists(nodes: &mut Vec<Node>) -> bool {
    let mut changed = false;
    let mut idx = 0;
    while idx < nodes.len() {
        let mergeable = idx + 1 < nodes.len()
            && match (nodes[idx].kind(), nodes[idx + 1].kind()) {
                (Some(a), Some(b)) => a.is_list() && a.same_variant(b),
                _ => false,
            };
        if mergeable {
            let next = nodes.remove(idx + 1);
            if let (Some(list), Node::Element(next)) = (nodes[idx].as_element_mut(), next) {
                list.children.extend(next.children);
            }
            changed = true;
            continue;
        }
        if let Node::Element(el) = &mut nodes[idx]
            && !el.kind.is_inline()
        {
            changed |= merge_adjacent_lists(&mut el.children);
        }
        idx += 1;
    }
    changed
}
