//! Base editing transforms.
//!
//! These are the behaviours of an editor with no plugins. Plugin hooks that
//! handle an event call into them directly rather than re-dispatching.

use std::collections::VecDeque;

use crate::document::path::{
    Affinity, block_len, block_offset_of, block_path_of, element_at, element_at_mut, end_point,
    first_text_path, fragment, last_text_path, next, node_at_mut, parent, siblings_mut,
    text_block_paths, topmost_between,
};
use crate::document::{Element, ElementKind, Mark, Node, Path, Point, Range};

use super::inlines::{
    char_count, fill_empty, inline_len, marks_at, replace_range, set_mark_in_range, split_inlines,
};
use super::{BlockCursor, ChangeKind, DataTransfer, EditError, Editor, TEXT_PLAIN};

/// Insert `node` so that it ends up at `path`.
pub(crate) fn insert_node_at(nodes: &mut Vec<Node>, path: &[usize], node: Node) -> Result<(), EditError> {
    let idx = *path.last().ok_or_else(|| EditError::InvalidPath(path.to_vec()))?;
    let siblings = siblings_mut(nodes, path).ok_or_else(|| EditError::InvalidPath(path.to_vec()))?;
    if idx > siblings.len() {
        return Err(EditError::InvalidPath(path.to_vec()));
    }
    siblings.insert(idx, node);
    Ok(())
}

pub(crate) fn remove_node_at(nodes: &mut Vec<Node>, path: &[usize]) -> Result<Node, EditError> {
    let idx = *path.last().ok_or_else(|| EditError::InvalidPath(path.to_vec()))?;
    let siblings = siblings_mut(nodes, path).ok_or_else(|| EditError::InvalidPath(path.to_vec()))?;
    if idx >= siblings.len() {
        return Err(EditError::InvalidPath(path.to_vec()));
    }
    Ok(siblings.remove(idx))
}

/// Remove ancestors left without children, starting at `path`.
fn prune_empty(nodes: &mut Vec<Node>, path: &[usize]) {
    let mut current = path.to_vec();
    while !current.is_empty() {
        let empty = element_at(nodes, &current).is_some_and(|el| el.children.is_empty());
        if !empty || remove_node_at(nodes, &current).is_err() {
            break;
        }
        current = parent(&current);
    }
}

fn is_paragraph_block(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|el| el.kind == ElementKind::Paragraph && (el.children.is_empty() || el.has_inline_children()))
}

impl Editor {
    /// The collapsed insertion point, deleting an expanded selection first.
    pub(crate) fn collapse_for_insert(&mut self) -> Option<Point> {
        if self.selection.as_ref()?.is_expanded() {
            self.delete_fragment();
        }
        self.selection.as_ref().map(|s| s.focus.clone())
    }

    pub(crate) fn base_insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let Some(point) = self.collapse_for_insert() else {
            return;
        };
        let Some(block) = block_path_of(&self.value, &point.path) else {
            return;
        };
        if self.block_is_void(&block) {
            self.insert_block_after(&block, Node::paragraph(text), false);
            return;
        }
        let pending = self.pending_marks.take();
        let leaf_marks = self.value_leaf(&point).map(|t| t.marks);
        match pending {
            Some(marks) if Some(marks) != leaf_marks => {
                let Some((_, offset)) = block_offset_of(&self.value, &point) else {
                    return;
                };
                if let Some(el) = element_at_mut(&mut self.value, &block) {
                    el.children = replace_range(&el.children, offset, offset, vec![Node::marked(text, marks)]);
                }
                self.select_block_offset(&block, offset + char_count(text), Affinity::Backward);
            }
            _ => {
                let Some(leaf) = node_at_mut(&mut self.value, &point.path).and_then(Node::as_text_mut) else {
                    return;
                };
                let idx = crate::document::path::byte_index(&leaf.text, point.offset);
                leaf.text.insert_str(idx, text);
                let moved = Point::new(point.path, point.offset + char_count(text));
                self.set_selection(Some(Range::collapsed(moved)));
            }
        }
    }

    fn value_leaf(&self, point: &Point) -> Option<&crate::document::Text> {
        crate::document::path::node_at(&self.value, &point.path)?.as_text()
    }

    /// Insert `node` as the next sibling of `block` and move the cursor to
    /// its start (or end).
    fn insert_block_after(&mut self, block: &[usize], node: Node, cursor_at_start: bool) {
        let path = next(block);
        if insert_node_at(&mut self.value, &path, node).is_err() {
            return;
        }
        let point = if cursor_at_start {
            crate::document::path::start_point(&self.value, &path)
        } else {
            end_point(&self.value, &path)
        };
        if let Some(point) = point {
            self.set_selection(Some(Range::collapsed(point)));
        }
    }

    pub(crate) fn base_insert_break(&mut self) {
        let Some(point) = self.collapse_for_insert() else {
            return;
        };
        let Some(block) = block_path_of(&self.value, &point.path) else {
            return;
        };
        let Some(el) = element_at(&self.value, &block).cloned() else {
            return;
        };
        if matches!(el.kind, ElementKind::CodeBlock { .. }) {
            self.base_insert_text("\n");
            return;
        }
        if self.is_void(&el) {
            self.insert_block_after(&block, Node::paragraph(""), true);
            return;
        }
        let Some((_, offset)) = block_offset_of(&self.value, &point) else {
            return;
        };
        if let Err(err) = self.split_block(&block, offset) {
            tracing::debug!(%err, "split failed");
        }
    }

    /// Split the text block at `block` at a char offset. The second half
    /// becomes the next sibling and receives the cursor. Splitting a heading
    /// at its end starts a paragraph.
    pub fn split_block(&mut self, block: &[usize], offset: usize) -> Result<Path, EditError> {
        let el = element_at(&self.value, block)
            .filter(|el| el.has_inline_children())
            .cloned()
            .ok_or_else(|| EditError::NotTextBlock(block.to_vec()))?;
        let marks = marks_at(&el.children, offset);
        let (left, right) = split_inlines(&el.children, offset);
        let kind = if inline_len(&right) == 0 && matches!(el.kind, ElementKind::Heading { .. }) {
            ElementKind::Paragraph
        } else {
            el.kind.clone()
        };
        let new_path = next(block);
        self.transact(ChangeKind::Other, |editor| {
            if let Some(target) = element_at_mut(&mut editor.value, block) {
                target.children = fill_empty(left, marks);
            }
            insert_node_at(&mut editor.value, &new_path, Node::element(kind, fill_empty(right, marks)))?;
            editor.select_block_offset(&new_path, 0, Affinity::Forward);
            Ok(new_path.clone())
        })
    }

    pub(crate) fn base_delete_backward(&mut self) {
        let Some(selection) = self.selection.clone() else {
            return;
        };
        if selection.is_expanded() {
            self.delete_fragment();
            return;
        }
        let Some(cursor) = self.block_cursor(&selection.focus) else {
            return;
        };
        let blocks = self.text_blocks();
        let block = blocks[cursor.ordinal].clone();
        if self.block_is_void(&block) {
            self.remove_block(&block);
            let target = match cursor.ordinal.checked_sub(1) {
                Some(ordinal) => cursor_at(ordinal, usize::MAX),
                None => cursor_at(0, 0),
            };
            self.select_ordinal(target, Affinity::Backward);
            return;
        }
        if cursor.offset > 0 {
            self.delete_in_block(&block, cursor.offset - 1, cursor.offset);
            return;
        }
        let Some(prev) = cursor.ordinal.checked_sub(1).map(|i| blocks[i].clone()) else {
            return;
        };
        if self.block_is_void(&prev) {
            self.remove_block(&prev);
            self.select_ordinal(
                BlockCursor {
                    ordinal: cursor.ordinal - 1,
                    offset: 0,
                },
                Affinity::Forward,
            );
        } else {
            self.merge_blocks(&prev, &block);
        }
    }

    pub(crate) fn base_delete_forward(&mut self) {
        let Some(selection) = self.selection.clone() else {
            return;
        };
        if selection.is_expanded() {
            self.delete_fragment();
            return;
        }
        let Some(cursor) = self.block_cursor(&selection.focus) else {
            return;
        };
        let blocks = self.text_blocks();
        let block = blocks[cursor.ordinal].clone();
        if self.block_is_void(&block) {
            self.remove_block(&block);
            self.select_ordinal(cursor_at(cursor.ordinal, 0), Affinity::Forward);
            return;
        }
        let len = block_len(&self.value, &block);
        if cursor.offset < len {
            self.delete_in_block(&block, cursor.offset, cursor.offset + 1);
            return;
        }
        let Some(next_block) = blocks.get(cursor.ordinal + 1).cloned() else {
            return;
        };
        if self.block_is_void(&next_block) {
            self.remove_block(&next_block);
            self.select_block_offset(&block, len, Affinity::Backward);
        } else {
            self.merge_blocks(&block, &next_block);
        }
    }

    pub(crate) fn base_delete_word_backward(&mut self) {
        let Some(selection) = self.selection.clone() else {
            return;
        };
        let Some(cursor) = self.block_cursor(&selection.focus) else {
            return;
        };
        if selection.is_expanded() || cursor.offset == 0 {
            self.base_delete_backward();
            return;
        }
        let block = self.text_blocks()[cursor.ordinal].clone();
        let text: Vec<char> = element_at(&self.value, &block)
            .map(|el| el.string().chars().collect())
            .unwrap_or_default();
        let from = word_start_before(&text, cursor.offset);
        self.delete_in_block(&block, from, cursor.offset);
    }

    /// Delete chars `from..to` of a text block and put the cursor at `from`.
    fn delete_in_block(&mut self, block: &[usize], from: usize, to: usize) {
        let Some(el) = element_at_mut(&mut self.value, block) else {
            return;
        };
        let marks = marks_at(&el.children, from);
        el.children = fill_empty(replace_range(&el.children, from, to, Vec::new()), marks);
        self.select_block_offset(block, from, Affinity::Backward);
    }

    /// Append the inline content of `second` to `first` and remove `second`.
    /// `first` must precede `second` in document order.
    fn merge_blocks(&mut self, first: &[usize], second: &[usize]) {
        let Some(moved) = element_at(&self.value, second).map(|el| el.children.clone()) else {
            return;
        };
        let first_len = block_len(&self.value, first);
        if let Some(el) = element_at_mut(&mut self.value, first) {
            el.children.extend(moved);
        }
        self.remove_block(second);
        self.select_block_offset(first, first_len, Affinity::Backward);
    }

    fn remove_block(&mut self, block: &[usize]) {
        if remove_node_at(&mut self.value, block).is_ok() {
            prune_empty(&mut self.value, &parent(block));
            self.ensure_block();
        }
    }

    /// Delete the selected content, leaving a collapsed selection.
    pub fn delete_fragment(&mut self) {
        let Some(selection) = self.selection.clone() else {
            return;
        };
        if selection.is_collapsed() {
            return;
        }
        self.transact(ChangeKind::Other, |editor| editor.delete_range(&selection));
    }

    fn delete_range(&mut self, range: &Range) {
        let (start, end) = range.edges();
        let (Some(start_cursor), Some(end_cursor)) = (self.block_cursor(&start), self.block_cursor(&end)) else {
            return;
        };
        let blocks = self.text_blocks();
        let start_block = blocks[start_cursor.ordinal].clone();
        let end_block = blocks[end_cursor.ordinal].clone();

        if start_block == end_block {
            if self.block_is_void(&start_block) {
                self.remove_block(&start_block);
                self.select_ordinal(start_cursor, Affinity::Forward);
            } else {
                self.delete_in_block(&start_block, start_cursor.offset, end_cursor.offset);
            }
            return;
        }

        let start_void = self.block_is_void(&start_block);
        let end_void = self.block_is_void(&end_block);

        // trim both edges first; inline edits leave block paths intact
        if !end_void && let Some(el) = element_at_mut(&mut self.value, &end_block) {
            let marks = marks_at(&el.children, end_cursor.offset);
            el.children = fill_empty(replace_range(&el.children, 0, end_cursor.offset, Vec::new()), marks);
        }
        if !start_void && let Some(el) = element_at_mut(&mut self.value, &start_block) {
            let len = inline_len(&el.children);
            let marks = marks_at(&el.children, start_cursor.offset);
            el.children = fill_empty(replace_range(&el.children, start_cursor.offset, len, Vec::new()), marks);
        }

        let (Some(from_leaf), Some(to_leaf)) = (
            last_text_path(&self.value, &start_block),
            first_text_path(&self.value, &end_block),
        ) else {
            return;
        };
        for path in topmost_between(&self.value, &from_leaf, &to_leaf).iter().rev() {
            let _ = remove_node_at(&mut self.value, path);
            prune_empty(&mut self.value, &parent(path));
        }

        let blocks = text_block_paths(&self.value);
        let ordinal = start_cursor.ordinal;
        let Some(end_block) = blocks.get(ordinal + 1).cloned() else {
            return;
        };
        match (start_void, end_void) {
            (false, false) => self.merge_blocks(&start_block, &end_block),
            (true, false) => {
                self.remove_block(&start_block);
                self.select_ordinal(cursor_at(ordinal, 0), Affinity::Forward);
            }
            (false, true) => {
                self.remove_block(&end_block);
                self.select_block_offset(&start_block, start_cursor.offset, Affinity::Backward);
            }
            (true, true) => {
                self.remove_block(&end_block);
                self.remove_block(&start_block);
                self.select_ordinal(cursor_at(ordinal, 0), Affinity::Forward);
            }
        }
    }

    /// Keep at least one block to hold the cursor.
    fn ensure_block(&mut self) {
        if text_block_paths(&self.value).is_empty() {
            self.value.push(Node::paragraph(""));
        }
    }

    /// Selected content with edge texts clipped.
    pub fn fragment(&self) -> Vec<Node> {
        self.selection
            .as_ref()
            .map(|range| fragment(&self.value, range))
            .unwrap_or_default()
    }

    /// Insert nodes at the selection. A single text block (or bare inline
    /// content) is spliced into the current block; anything else is inserted
    /// as blocks, splitting the current block around them.
    pub fn insert_fragment(&mut self, nodes: Vec<Node>) {
        if nodes.is_empty() {
            return;
        }
        self.transact(ChangeKind::Other, |editor| {
            let Some(point) = editor.collapse_for_insert() else {
                return;
            };
            let inline = match nodes.as_slice() {
                [Node::Element(el)]
                    if el.has_inline_children()
                        && !el.kind.is_inline()
                        && !el.kind.is_container()
                        && !editor.is_void(el) =>
                {
                    Some(el.children.clone())
                }
                _ if nodes.iter().all(Node::is_inline_content) => Some(nodes.clone()),
                _ => None,
            };
            match inline {
                Some(inlines) => editor.insert_inlines(&point, inlines),
                None => editor.insert_blocks(&point, nodes),
            }
        });
    }

    fn insert_inlines(&mut self, point: &Point, inlines: Vec<Node>) {
        let Some((block, offset)) = block_offset_of(&self.value, point) else {
            return;
        };
        if self.block_is_void(&block) {
            let paragraph = Node::element(ElementKind::Paragraph, inlines);
            self.insert_block_after(&block, paragraph, false);
            return;
        }
        let len = inline_len(&inlines);
        if let Some(el) = element_at_mut(&mut self.value, &block) {
            el.children = replace_range(&el.children, offset, offset, inlines);
        }
        self.select_block_offset(&block, offset + len, Affinity::Backward);
    }

    /// Insert blocks at `point`. Leading and trailing paragraphs merge into
    /// the halves of the split block; empty halves are dropped.
    pub(crate) fn insert_blocks(&mut self, point: &Point, blocks: Vec<Node>) {
        let Some((block, offset)) = block_offset_of(&self.value, point) else {
            return;
        };
        let Some(el) = element_at(&self.value, &block).cloned() else {
            return;
        };
        let void = self.is_void(&el);
        let (mut head, mut tail) = if void {
            (Vec::new(), Vec::new())
        } else {
            split_inlines(&el.children, offset)
        };
        let head_len = inline_len(&head);
        let tail_empty = inline_len(&tail) == 0;
        let mut blocks = VecDeque::from(blocks);

        let mut head_cursor = None;
        if head_len > 0
            && blocks.front().is_some_and(is_paragraph_block)
            && let Some(Node::Element(first)) = blocks.pop_front()
        {
            head_cursor = Some(head_len + inline_len(&first.children));
            head.extend(first.children);
        }
        let mut tail_cursor = None;
        if !tail_empty
            && blocks.back().is_some_and(is_paragraph_block)
            && let Some(Node::Element(last)) = blocks.pop_back()
        {
            tail_cursor = Some(inline_len(&last.children));
            let mut merged = last.children;
            merged.extend(tail);
            tail = merged;
        }

        let mut replacement: Vec<Node> = Vec::new();
        if void {
            replacement.push(el.clone().into());
        } else if head_len > 0 {
            replacement.push(Element::new(el.kind.clone(), head).into());
        }
        let head_count = replacement.len();
        let inserted = blocks.len();
        replacement.extend(blocks);
        if !void && (!tail_empty || tail_cursor.is_some()) {
            replacement.push(Element::new(el.kind.clone(), tail).into());
        }
        if replacement.is_empty() {
            return;
        }

        let (target, target_offset) = if let Some(offset) = tail_cursor {
            (replacement.len() - 1, Some(offset))
        } else if inserted > 0 {
            (head_count + inserted - 1, None)
        } else {
            (0, head_cursor)
        };
        let count = replacement.len();
        let idx = block.last().copied().unwrap_or(0);
        let Some(siblings) = siblings_mut(&mut self.value, &block) else {
            return;
        };
        siblings.splice(idx..=idx, replacement);
        tracing::trace!(blocks = count, "inserted blocks");

        let mut target_path = parent(&block);
        target_path.push(idx + target);
        match target_offset {
            Some(offset) => self.select_block_offset(&target_path, offset, Affinity::Backward),
            None => {
                if let Some(point) = end_point(&self.value, &target_path) {
                    self.set_selection(Some(Range::collapsed(point)));
                }
            }
        }
    }

    /// Plain text paste: lines become paragraph breaks.
    pub(crate) fn insert_text_data(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n");
        for (idx, line) in text.split('\n').enumerate() {
            if idx > 0 {
                self.base_insert_break();
            }
            self.base_insert_text(line);
        }
    }

    pub(crate) fn base_insert_data(&mut self, data: &DataTransfer) {
        if let Some(nodes) = data.fragment() {
            self.insert_fragment(nodes);
        } else if let Some(text) = data.get_data(TEXT_PLAIN) {
            self.insert_text_data(text);
        }
    }

    // --- Structural transforms ---

    /// Insert a node at an explicit path.
    pub fn insert_node(&mut self, path: &[usize], node: Node) -> Result<(), EditError> {
        self.transact(ChangeKind::Other, |editor| insert_node_at(&mut editor.value, path, node))
    }

    /// Remove the node at an explicit path, pruning emptied ancestors.
    pub fn remove_node(&mut self, path: &[usize]) -> Result<Node, EditError> {
        self.transact(ChangeKind::Other, |editor| {
            let removed = remove_node_at(&mut editor.value, path)?;
            prune_empty(&mut editor.value, &parent(path));
            Ok(removed)
        })
    }

    pub(crate) fn set_kind(&mut self, path: &[usize], kind: ElementKind) {
        if let Some(el) = element_at_mut(&mut self.value, path) {
            el.kind = kind;
        }
    }

    /// Move the node at `path` out of its parent, splitting the parent
    /// around it. Returns the node's new path.
    pub(crate) fn lift_node(&mut self, path: &[usize]) -> Option<Path> {
        if path.len() < 2 {
            return None;
        }
        let parent_path = parent(path);
        let idx = *path.last()?;
        let parent_el = element_at(&self.value, &parent_path)?.clone();
        let node = parent_el.children.get(idx)?.clone();
        let before = parent_el.children[..idx].to_vec();
        let after = parent_el.children[idx + 1..].to_vec();
        let after_kind = match parent_el.kind {
            ElementKind::NumberedList { start } => ElementKind::NumberedList {
                start: start + idx as u64 + 1,
            },
            ref kind => kind.clone(),
        };

        let mut replacement = Vec::new();
        if !before.is_empty() {
            replacement.push(Element::new(parent_el.kind.clone(), before).into());
        }
        let offset = replacement.len();
        replacement.push(node);
        if !after.is_empty() {
            replacement.push(Element::new(after_kind, after).into());
        }
        let parent_idx = *parent_path.last()?;
        let siblings = siblings_mut(&mut self.value, &parent_path)?;
        siblings.splice(parent_idx..=parent_idx, replacement);
        let mut lifted = parent(&parent_path);
        lifted.push(parent_idx + offset);
        Some(lifted)
    }

    /// Wrap siblings `first..=last` under `parent_path` in a new element.
    pub(crate) fn wrap_nodes(&mut self, parent_path: &[usize], first: usize, last: usize, kind: ElementKind) {
        let siblings = if parent_path.is_empty() {
            Some(&mut self.value)
        } else {
            element_at_mut(&mut self.value, parent_path).map(|el| &mut el.children)
        };
        let Some(siblings) = siblings else {
            return;
        };
        if first > last || last >= siblings.len() {
            return;
        }
        let wrapped: Vec<Node> = siblings.drain(first..=last).collect();
        siblings.insert(first, Node::element(kind, wrapped));
    }

    // --- Marks ---

    pub(crate) fn set_mark(&mut self, mark: Mark, on: bool) {
        let Some(selection) = self.selection.clone() else {
            return;
        };
        if selection.is_collapsed() {
            let mut marks = self.marks().unwrap_or_default();
            marks.set(mark, on);
            self.pending_marks = Some(marks);
            return;
        }
        self.transact(ChangeKind::Other, |editor| {
            let Some((start, end)) = editor.selection_edges() else {
                return;
            };
            let blocks = editor.text_blocks();
            for ordinal in start.ordinal..=end.ordinal {
                let Some(path) = blocks.get(ordinal) else {
                    continue;
                };
                if editor.block_is_void(path) {
                    continue;
                }
                let from = if ordinal == start.ordinal { start.offset } else { 0 };
                let to = if ordinal == end.ordinal {
                    end.offset
                } else {
                    block_len(&editor.value, path)
                };
                if from >= to {
                    continue;
                }
                if let Some(el) = element_at_mut(&mut editor.value, path) {
                    el.children = set_mark_in_range(&el.children, from, to, mark, on);
                }
            }
            let (Some(first), Some(second)) = (
                editor.point_for(start, Affinity::Forward),
                editor.point_for(end, Affinity::Backward),
            ) else {
                return;
            };
            let range = if selection.is_backward() {
                Range::new(second, first)
            } else {
                Range::new(first, second)
            };
            editor.set_selection(Some(range));
        });
    }
}

const fn cursor_at(ordinal: usize, offset: usize) -> BlockCursor {
    BlockCursor { ordinal, offset }
}

/// Start of the word before `offset`: trailing whitespace, then the word.
pub(crate) fn word_start_before(text: &[char], offset: usize) -> usize {
    let mut idx = offset.min(text.len());
    while idx > 0 && text[idx - 1].is_whitespace() {
        idx -= 1;
    }
    while idx > 0 && !text[idx - 1].is_whitespace() {
        idx -= 1;
    }
    idx
}

/// End of the word after `offset`: leading whitespace, then the word.
pub(crate) fn word_end_after(text: &[char], offset: usize) -> usize {
    let mut idx = offset.min(text.len());
    while idx < text.len() && text[idx].is_whitespace() {
        idx += 1;
    }
    while idx < text.len() && !text[idx].is_whitespace() {
        idx += 1;
    }
    idx
}
