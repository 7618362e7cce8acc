//! Clause drag-and-drop (experimental).
//!
//! A drag carries the range of the dragged node as base64 JSON. A drop
//! moves the clause enclosing that range to the drop point, splitting the
//! target block around it. Every payload field is validated before the
//! document is touched.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::document::path::{
    block_offset_of, element_at, find_ancestor, is_ancestor, is_valid_point, next, node_range,
    parent, start_point, text_block_paths,
};
use crate::document::{ElementKind, Path, Point, Range};
use crate::editor::{ChangeKind, DataTransfer, EditError, Editor};

pub const DRAG_MIME: &str = "application/x-markwright-range";

#[derive(Debug, thiserror::Error)]
pub enum DropError {
    #[error("drop carries no {DRAG_MIME} payload")]
    Missing,
    #[error("drag payload is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("drag payload is not a range: {0}")]
    Json(#[from] serde_json::Error),
    #[error("dragged range {0:?} is not in the document")]
    InvalidRange(Range),
    #[error("drop target {0:?} is not in the document")]
    InvalidTarget(Point),
    #[error("dragged range is not inside a clause")]
    NoClause,
    #[error("cannot drop a clause inside itself")]
    DropInsideSource,
    #[error("drops are disabled")]
    NotEditable,
    #[error(transparent)]
    Edit(#[from] EditError),
}

/// Drop effect reported while dragging over the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropEffect {
    Move,
}

/// Payload for dragging the node at `path`.
pub fn drag_payload(editor: &Editor, path: &[usize]) -> Option<DataTransfer> {
    let range = node_range(editor.value(), path)?;
    let json = serde_json::to_vec(&range).ok()?;
    let mut data = DataTransfer::new();
    data.set_data(DRAG_MIME, STANDARD.encode(json));
    Some(data)
}

pub const fn drag_over(_data: &DataTransfer) -> DropEffect {
    DropEffect::Move
}

fn decode_range(data: &DataTransfer) -> Result<Range, DropError> {
    let payload = data.get_data(DRAG_MIME).ok_or(DropError::Missing)?;
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn is_clause(kind: &ElementKind) -> bool {
    matches!(kind, ElementKind::Clause { .. })
}

fn ordinal_of(editor: &Editor, block: &[usize]) -> Option<usize> {
    text_block_paths(editor.value()).iter().position(|p| p == block)
}

/// Move the clause named by `data` to `target`.
pub fn drop_clause(editor: &mut Editor, data: &DataTransfer, target: &Point) -> Result<Path, DropError> {
    let range = decode_range(data)?;
    let value = editor.value();
    if !is_valid_point(value, &range.anchor) || !is_valid_point(value, &range.focus) {
        return Err(DropError::InvalidRange(range));
    }
    if !is_valid_point(value, target) {
        return Err(DropError::InvalidTarget(target.clone()));
    }
    let clause = find_ancestor(value, &range.anchor.path, |el| is_clause(&el.kind))
        .ok_or(DropError::NoClause)?;
    if is_ancestor(&clause, &target.path) {
        return Err(DropError::DropInsideSource);
    }
    let (target_block, offset) =
        block_offset_of(value, target).ok_or_else(|| DropError::InvalidTarget(target.clone()))?;
    let target_ordinal =
        ordinal_of(editor, &target_block).ok_or_else(|| DropError::InvalidTarget(target.clone()))?;
    let clause_blocks = text_block_paths(value)
        .iter()
        .filter(|p| is_ancestor(&clause, p))
        .count();
    let clause_before_target = clause.as_slice() < target_block.as_slice();

    tracing::debug!(editor = %editor.id(), ?clause, ?target_block, offset, "drop clause");
    editor.try_transact(ChangeKind::Other, |editor| -> Result<Path, DropError> {
        editor.select(range.clone())?;
        let node = editor.remove_node(&clause)?;

        // Block ordinals are stable across the removal, paths are not.
        let ordinal = if clause_before_target {
            target_ordinal - clause_blocks
        } else {
            target_ordinal
        };
        let block = text_block_paths(editor.value())
            .get(ordinal)
            .cloned()
            .ok_or_else(|| DropError::InvalidTarget(target.clone()))?;
        let dest = insertion_path(editor, &block, offset)?;
        editor.insert_node(&dest, node)?;
        if let Some(start) = start_point(editor.value(), &dest) {
            editor.select(Range::collapsed(start))?;
        }
        Ok(dest)
    })
}

/// Where a dropped clause goes for a drop at `offset` in `block`: between
/// the halves of a split text block, or beside the nearest ancestor that
/// may hold a clause.
fn insertion_path(editor: &mut Editor, block: &[usize], offset: usize) -> Result<Path, DropError> {
    let mut anchor = block.to_vec();
    while anchor.len() > 1
        && element_at(editor.value(), &parent(&anchor)).is_some_and(|el| !is_clause(&el.kind))
    {
        anchor = parent(&anchor);
    }
    if anchor != block {
        return Ok(next(&anchor));
    }
    let Some(el) = element_at(editor.value(), block) else {
        return Err(DropError::Edit(EditError::InvalidPath(block.to_vec())));
    };
    let len = el.string().chars().count();
    if editor.is_void(el) || offset >= len {
        return Ok(next(block));
    }
    if offset == 0 {
        return Ok(block.to_vec());
    }
    editor.split_block(block, offset)?;
    Ok(next(block))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Node, markdown_to_value, value_to_markdown};
    use crate::editor::build_editor;

    const DOC: &str = "Intro text\n\n{{#clause payment}}\nPay on time.\n{{/clause}}\n\nClosing words";

    fn clause_editor() -> Editor {
        let mut editor = build_editor(None);
        editor.reset(markdown_to_value(DOC));
        editor
    }

    fn kinds(editor: &Editor) -> Vec<&'static str> {
        editor
            .value()
            .iter()
            .filter_map(Node::kind)
            .map(ElementKind::type_name)
            .collect()
    }

    #[test]
    fn test_drag_payload_round_trips_range() {
        let editor = clause_editor();
        let data = drag_payload(&editor, &[1]).unwrap();
        let range = decode_range(&data).unwrap();
        assert_eq!(range.anchor.path, vec![1, 0, 0]);
        assert_eq!(drag_over(&data), DropEffect::Move);
    }

    #[test]
    fn test_drop_moves_clause_into_split_block() {
        let mut editor = clause_editor();
        assert_eq!(kinds(&editor), vec!["paragraph", "clause", "paragraph"]);
        let data = drag_payload(&editor, &[1]).unwrap();
        let target = Point::new(vec![2, 0], 4);
        let dest = drop_clause(&mut editor, &data, &target).unwrap();
        assert_eq!(dest, vec![2]);
        assert_eq!(kinds(&editor), vec!["paragraph", "paragraph", "clause", "paragraph"]);
        assert_eq!(editor.value()[1].string(), "Clos");
        assert_eq!(editor.value()[3].string(), "ing words");
        assert_eq!(editor.focus_position(), Some((2, 0)));
    }

    #[test]
    fn test_drop_at_block_start_inserts_before() {
        let mut editor = clause_editor();
        let data = drag_payload(&editor, &[1]).unwrap();
        drop_clause(&mut editor, &data, &Point::new(vec![0, 0], 0)).unwrap();
        assert_eq!(kinds(&editor), vec!["clause", "paragraph", "paragraph"]);
        assert_eq!(editor.value()[1].string(), "Intro text");
    }

    #[test]
    fn test_invalid_payloads_leave_document_untouched() {
        let mut editor = clause_editor();
        let before = value_to_markdown(editor.value());
        let target = Point::new(vec![0, 0], 0);

        assert!(matches!(
            drop_clause(&mut editor, &DataTransfer::plain("x"), &target),
            Err(DropError::Missing)
        ));
        let mut bad = DataTransfer::new();
        bad.set_data(DRAG_MIME, "%%%");
        assert!(matches!(drop_clause(&mut editor, &bad, &target), Err(DropError::Base64(_))));
        bad.set_data(DRAG_MIME, STANDARD.encode("[1,2]"));
        assert!(matches!(drop_clause(&mut editor, &bad, &target), Err(DropError::Json(_))));
        let far = Range::collapsed(Point::new(vec![9, 0], 0));
        bad.set_data(DRAG_MIME, STANDARD.encode(serde_json::to_vec(&far).unwrap()));
        assert!(matches!(
            drop_clause(&mut editor, &bad, &target),
            Err(DropError::InvalidRange(_))
        ));

        assert_eq!(value_to_markdown(editor.value()), before);
    }

    #[test]
    fn test_drop_requires_a_clause_and_an_outside_target() {
        let mut editor = clause_editor();
        let plain = drag_payload(&editor, &[0]).unwrap();
        assert!(matches!(
            drop_clause(&mut editor, &plain, &Point::new(vec![2, 0], 0)),
            Err(DropError::NoClause)
        ));
        let clause = drag_payload(&editor, &[1]).unwrap();
        assert!(matches!(
            drop_clause(&mut editor, &clause, &Point::new(vec![1, 0, 0], 2)),
            Err(DropError::DropInsideSource)
        ));
        assert!(matches!(
            drop_clause(&mut editor, &clause, &Point::new(vec![7, 0], 0)),
            Err(DropError::InvalidTarget(_))
        ));
    }
}
