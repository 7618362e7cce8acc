//! Mark and block formatting toggles, as driven by hotkeys and the toolbar.

use crate::document::path::{element_at, find_ancestor, parent};
use crate::document::{ElementKind, Mark};

use super::{ChangeKind, Editor};

/// A block type the selection can be switched to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFormat {
    Paragraph,
    Heading(u8),
    BlockQuote,
    CodeBlock,
    BulletedList,
    NumberedList,
}

impl BlockFormat {
    pub fn kind(self) -> ElementKind {
        match self {
            Self::Paragraph => ElementKind::Paragraph,
            Self::Heading(level) => ElementKind::Heading {
                level: level.clamp(1, 6),
            },
            Self::BlockQuote => ElementKind::BlockQuote,
            Self::CodeBlock => ElementKind::CodeBlock { info: None },
            Self::BulletedList => ElementKind::BulletedList,
            Self::NumberedList => ElementKind::NumberedList { start: 1 },
        }
    }

    pub const fn is_list(self) -> bool {
        matches!(self, Self::BulletedList | Self::NumberedList)
    }

    /// Whether an element of `kind` counts as this format.
    pub fn matches(self, kind: &ElementKind) -> bool {
        match (self, kind) {
            (Self::Heading(level), ElementKind::Heading { level: other }) => level == *other,
            (Self::Heading(_), _) => false,
            _ => self.kind().same_variant(kind),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading(1) => "heading one",
            Self::Heading(2) => "heading two",
            Self::Heading(3) => "heading three",
            Self::Heading(_) => "heading",
            Self::BlockQuote => "block quote",
            Self::CodeBlock => "code block",
            Self::BulletedList => "bulleted list",
            Self::NumberedList => "numbered list",
        }
    }
}

pub fn is_mark_active(editor: &Editor, mark: Mark) -> bool {
    editor.marks().is_some_and(|marks| marks.has(mark))
}

pub fn toggle_mark(editor: &mut Editor, mark: Mark) {
    if is_mark_active(editor, mark) {
        editor.remove_mark(mark);
    } else {
        editor.add_mark(mark);
    }
}

/// Whether any selected text block has `format` (for lists: sits in a list
/// of that type).
pub fn is_block_active(editor: &Editor, format: BlockFormat) -> bool {
    let Some((start, end)) = editor.selection_edges() else {
        return false;
    };
    let blocks = editor.text_blocks();
    let value = editor.value();
    blocks
        .iter()
        .take(end.ordinal + 1)
        .skip(start.ordinal)
        .any(|path| {
            if format.is_list() {
                find_ancestor(value, path, |el| el.kind.is_list())
                    .and_then(|list| element_at(value, &list))
                    .is_some_and(|list| format.matches(&list.kind))
            } else {
                element_at(value, path).is_some_and(|el| format.matches(&el.kind))
            }
        })
}

/// Switch the selected blocks to `format`, or back to paragraphs when it is
/// already active. Selected list items are lifted out of their lists first;
/// switching to a list wraps each run of adjacent siblings in a new list.
pub fn toggle_block(editor: &mut Editor, format: BlockFormat) {
    let active = is_block_active(editor, format);
    tracing::debug!(format = format.label(), active, "toggle block");
    editor.transact(ChangeKind::Other, |editor| {
        let Some((start, end)) = editor.selection_edges() else {
            return;
        };
        let captured = editor.capture_selection();

        for ordinal in (start.ordinal..=end.ordinal).rev() {
            let Some(block) = editor.text_blocks().get(ordinal).cloned() else {
                continue;
            };
            let item = find_ancestor(editor.value(), &block, |el| el.kind == ElementKind::ListItem);
            if let Some(item) = item
                && element_at(editor.value(), &parent(&item)).is_some_and(|p| p.kind.is_list())
            {
                editor.lift_node(&item);
            }
        }

        let kind = if active {
            ElementKind::Paragraph
        } else if format.is_list() {
            ElementKind::ListItem
        } else {
            format.kind()
        };
        let blocks = editor.text_blocks();
        let selected: Vec<_> = blocks
            .iter()
            .take(end.ordinal + 1)
            .skip(start.ordinal)
            .filter(|path| !editor.block_is_void(path))
            .cloned()
            .collect();
        for path in &selected {
            editor.set_kind(path, kind.clone());
        }

        if !active && format.is_list() {
            for (parent_path, first, last) in sibling_runs(&selected).into_iter().rev() {
                editor.wrap_nodes(&parent_path, first, last, format.kind());
            }
        }

        if let Some(captured) = captured {
            editor.restore_selection(captured);
        }
    });
}

/// Group paths into runs of adjacent siblings: `(parent, first, last)`.
fn sibling_runs(paths: &[Vec<usize>]) -> Vec<(Vec<usize>, usize, usize)> {
    let mut runs: Vec<(Vec<usize>, usize, usize)> = Vec::new();
    for path in paths {
        let Some((&idx, parent_path)) = path.split_last() else {
            continue;
        };
        match runs.last_mut() {
            Some((run_parent, _, last)) if run_parent.as_slice() == parent_path && *last + 1 == idx => {
                *last = idx;
            }
            _ => runs.push((parent_path.to_vec(), idx, idx)),
        }
    }
    runs
}
