//! Structured document editor.
//!
//! An [`Editor`] owns a document value and a selection, and exposes the
//! editing primitives the component layer composes: text insertion, block
//! splitting, deletion, fragments, marks and history. Behaviour is layered
//! on with [`Plugin`]s (see [`plugins`]), each registered by a `with_*`
//! function that takes and returns the editor.
//!
//! Every mutation runs inside a transaction. When the outermost transaction
//! ends the document is normalized, the selection is re-validated, the
//! previous state is recorded in the history (if any), and the change is
//! flagged for [`Editor::take_change`].

mod data;
mod formatting;
mod history;
mod inlines;
mod movement;
mod normalize;
pub mod plugins;
mod transforms;

#[cfg(test)]
mod tests;

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::document::path::{
    Affinity, block_offset_of, clamp_point, element_at, is_valid_point, node_at,
    point_at_block_offset, text_block_paths, text_paths,
};
use crate::document::{Element, Mark, Marks, Node, Path, Point, Range, Value};

pub use data::{
    DataTransfer, FRAGMENT_MIME, TEXT_HTML, TEXT_PLAIN, decode_fragment, encode_fragment,
};
pub use formatting::{BlockFormat, is_block_active, is_mark_active, toggle_block, toggle_mark};
pub use history::{ChangeKind, History, MAX_STEPS, Snapshot};
pub use movement::Direction;
pub use plugins::{
    AugmentFn, Flow, Plugin, active_link, build_editor, insert_image, insert_link,
    is_link_active, is_selection_link_body, selection_link_path, unwrap_link, with_history, with_html, with_images,
    with_links, with_lists, with_schema,
};

/// Upper bound on normalization passes per transaction.
const MAX_NORMALIZE_PASSES: usize = 32;

static NEXT_EDITOR_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an editor instance, stable for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorId(u64);

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor-{}", self.0)
    }
}

/// Errors from transforms that take explicit locations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("no node at path {0:?}")]
    InvalidPath(Path),
    #[error("point {0:?} does not address a text offset")]
    InvalidPoint(Point),
    #[error("path {0:?} is not a text block")]
    NotTextBlock(Path),
}

/// What changed since the last [`Editor::take_change`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Change {
    pub value: bool,
    pub selection: bool,
}

/// A position as (text block ordinal, char offset in that block).
///
/// Ordinals survive structural edits that only move blocks around, which
/// makes them the currency for keeping the selection stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlockCursor {
    pub ordinal: usize,
    pub offset: usize,
}

pub struct Editor {
    id: EditorId,
    value: Value,
    selection: Option<Range>,
    pending_marks: Option<Marks>,
    plugins: Vec<Rc<dyn Plugin>>,
    history: Option<History>,
    depth: usize,
    before: Option<Snapshot>,
    change: Change,
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Editor")
            .field("id", &self.id)
            .field("plugins", &self.plugin_names())
            .field("selection", &self.selection)
            .field("blocks", &self.value.len())
            .finish_non_exhaustive()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// A bare editor holding one empty paragraph, with no plugins.
    pub fn new() -> Self {
        Self {
            id: EditorId(NEXT_EDITOR_ID.fetch_add(1, Ordering::Relaxed)),
            value: vec![Node::paragraph("")],
            selection: None,
            pending_marks: None,
            plugins: Vec::new(),
            history: None,
            depth: 0,
            before: None,
            change: Change::default(),
        }
    }

    pub const fn id(&self) -> EditorId {
        self.id
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub const fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    /// Add a plugin as the new outermost layer.
    #[must_use]
    pub fn register(mut self, plugin: impl Plugin + 'static) -> Self {
        tracing::debug!(editor = %self.id, plugin = plugin.name(), "registering plugin");
        self.plugins.push(Rc::new(plugin));
        self
    }

    /// Plugin names, innermost first.
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub fn has_plugin(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub(crate) fn enable_history(&mut self) {
        self.history.get_or_insert_with(History::default);
    }

    pub const fn history(&self) -> Option<&History> {
        self.history.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.history.as_ref().is_some_and(History::can_redo)
    }

    /// Replace the document without recording history. The selection is
    /// cleared.
    pub fn reset(&mut self, value: Value) {
        self.value = value;
        self.selection = None;
        self.pending_marks = None;
        let plugins = self.plugins.clone();
        self.run_normalize(&plugins);
        if let Some(history) = &mut self.history {
            history.clear();
        }
        self.change = Change::default();
    }

    pub fn is_inline(&self, element: &Element) -> bool {
        self.plugins
            .iter()
            .rev()
            .find_map(|p| p.is_inline(element))
            .unwrap_or(false)
    }

    pub fn is_void(&self, element: &Element) -> bool {
        self.plugins
            .iter()
            .rev()
            .find_map(|p| p.is_void(element))
            .unwrap_or(false)
    }

    pub(crate) fn block_is_void(&self, block: &[usize]) -> bool {
        element_at(&self.value, block).is_some_and(|el| self.is_void(el))
    }

    // --- Selection ---

    /// Select `range`. Both points must address existing text offsets.
    pub fn select(&mut self, range: Range) -> Result<(), EditError> {
        for point in [&range.anchor, &range.focus] {
            if !is_valid_point(&self.value, point) {
                return Err(EditError::InvalidPoint(point.clone()));
            }
        }
        self.set_selection(Some(range));
        Ok(())
    }

    pub fn deselect(&mut self) {
        self.set_selection(None);
    }

    pub(crate) fn set_selection(&mut self, selection: Option<Range>) {
        if self.selection == selection {
            return;
        }
        self.selection = selection;
        self.pending_marks = None;
        if self.depth == 0 {
            self.change.selection = true;
            if let Some(history) = &mut self.history {
                history.break_merge();
            }
        }
    }

    pub(crate) fn text_blocks(&self) -> Vec<Path> {
        text_block_paths(&self.value)
    }

    pub(crate) fn block_cursor(&self, point: &Point) -> Option<BlockCursor> {
        let (block, offset) = block_offset_of(&self.value, point)?;
        let ordinal = self.text_blocks().iter().position(|b| *b == block)?;
        Some(BlockCursor { ordinal, offset })
    }

    pub(crate) fn point_for(&self, cursor: BlockCursor, affinity: Affinity) -> Option<Point> {
        let blocks = self.text_blocks();
        let last = blocks.len().checked_sub(1)?;
        let ordinal = cursor.ordinal.min(last);
        let offset = if cursor.ordinal > last {
            usize::MAX
        } else {
            cursor.offset
        };
        point_at_block_offset(&self.value, &blocks[ordinal], offset, affinity)
    }

    pub(crate) fn select_block_offset(&mut self, block: &[usize], offset: usize, affinity: Affinity) {
        if let Some(point) = point_at_block_offset(&self.value, block, offset, affinity) {
            self.set_selection(Some(Range::collapsed(point)));
        }
    }

    pub(crate) fn select_ordinal(&mut self, cursor: BlockCursor, affinity: Affinity) {
        if let Some(point) = self.point_for(cursor, affinity) {
            self.set_selection(Some(Range::collapsed(point)));
        }
    }

    /// Selection as block cursors `(anchor, focus)`.
    pub(crate) fn capture_selection(&self) -> Option<(BlockCursor, BlockCursor)> {
        let selection = self.selection.as_ref()?;
        Some((
            self.block_cursor(&selection.anchor)?,
            self.block_cursor(&selection.focus)?,
        ))
    }

    /// Inverse of [`Self::capture_selection`]. The start edge binds forward
    /// and the end edge backward, so marked spans stay selected after their
    /// leaves are split or merged.
    pub(crate) fn restore_selection(&mut self, (anchor, focus): (BlockCursor, BlockCursor)) {
        let anchor_first = (anchor.ordinal, anchor.offset) <= (focus.ordinal, focus.offset);
        let collapsed = anchor == focus;
        let (anchor_affinity, focus_affinity) = if collapsed {
            (Affinity::Backward, Affinity::Backward)
        } else if anchor_first {
            (Affinity::Forward, Affinity::Backward)
        } else {
            (Affinity::Backward, Affinity::Forward)
        };
        let (Some(anchor), Some(focus)) = (
            self.point_for(anchor, anchor_affinity),
            self.point_for(focus, focus_affinity),
        ) else {
            return;
        };
        self.set_selection(Some(Range::new(anchor, focus)));
    }

    /// Start and end of the selection as block cursors, in document order.
    pub(crate) fn selection_edges(&self) -> Option<(BlockCursor, BlockCursor)> {
        let (start, end) = self.selection.as_ref()?.edges();
        Some((self.block_cursor(&start)?, self.block_cursor(&end)?))
    }

    fn validate_selection(&mut self) {
        let Some(selection) = self.selection.clone() else {
            return;
        };
        if is_valid_point(&self.value, &selection.anchor) && is_valid_point(&self.value, &selection.focus) {
            return;
        }
        let anchor = clamp_point(&self.value, &selection.anchor);
        let focus = clamp_point(&self.value, &selection.focus);
        let repaired = match (anchor, focus) {
            (Some(anchor), Some(focus)) => Some(Range::new(anchor, focus)),
            _ => None,
        };
        self.set_selection(repaired);
    }

    // --- Marks ---

    /// Marks that typed text would get: pending marks, else the marks of the
    /// text at the cursor, else of the first selected text with content.
    pub fn marks(&self) -> Option<Marks> {
        if let Some(marks) = self.pending_marks {
            return Some(marks);
        }
        let selection = self.selection.as_ref()?;
        if selection.is_collapsed() {
            let (block, offset) = block_offset_of(&self.value, &selection.focus)?;
            let point = point_at_block_offset(&self.value, &block, offset, Affinity::Backward)?;
            return node_at(&self.value, &point.path)?.as_text().map(|t| t.marks);
        }
        let (start, end) = selection.edges();
        let mut first = None;
        for leaf in text_paths(&self.value) {
            if leaf < start.path || leaf > end.path {
                continue;
            }
            let Some(text) = node_at(&self.value, &leaf).and_then(Node::as_text) else {
                continue;
            };
            first.get_or_insert(text.marks);
            let from = if leaf == start.path { start.offset } else { 0 };
            let to = if leaf == end.path { end.offset } else { text.char_len() };
            if from < to {
                return Some(text.marks);
            }
        }
        first
    }

    pub fn add_mark(&mut self, mark: Mark) {
        self.set_mark(mark, true);
    }

    pub fn remove_mark(&mut self, mark: Mark) {
        self.set_mark(mark, false);
    }

    pub const fn pending_marks(&self) -> Option<Marks> {
        self.pending_marks
    }

    // --- Dispatch through plugins ---

    pub fn insert_text(&mut self, text: &str) {
        let plugins = self.plugins.clone();
        self.transact(ChangeKind::Typing, |editor| {
            if plugins
                .iter()
                .rev()
                .any(|p| p.insert_text(editor, text) == Flow::Handled)
            {
                return;
            }
            editor.base_insert_text(text);
        });
    }

    pub fn insert_break(&mut self) {
        let plugins = self.plugins.clone();
        self.transact(ChangeKind::Other, |editor| {
            if plugins
                .iter()
                .rev()
                .any(|p| p.insert_break(editor) == Flow::Handled)
            {
                return;
            }
            editor.base_insert_break();
        });
    }

    pub fn delete_backward(&mut self) {
        let plugins = self.plugins.clone();
        self.transact(ChangeKind::Deleting, |editor| {
            if plugins
                .iter()
                .rev()
                .any(|p| p.delete_backward(editor) == Flow::Handled)
            {
                return;
            }
            editor.base_delete_backward();
        });
    }

    pub fn delete_forward(&mut self) {
        self.transact(ChangeKind::Deleting, Self::base_delete_forward);
    }

    pub fn delete_word_backward(&mut self) {
        self.transact(ChangeKind::Deleting, Self::base_delete_word_backward);
    }

    /// Insert clipboard or drop data at the selection.
    pub fn insert_data(&mut self, data: &DataTransfer) {
        let plugins = self.plugins.clone();
        self.transact(ChangeKind::Other, |editor| {
            if plugins
                .iter()
                .rev()
                .any(|p| p.insert_data(editor, data) == Flow::Handled)
            {
                return;
            }
            editor.base_insert_data(data);
        });
    }

    pub fn undo(&mut self) {
        let plugins = self.plugins.clone();
        for plugin in plugins.iter().rev() {
            if plugin.undo(self) == Flow::Handled {
                return;
            }
        }
    }

    pub fn redo(&mut self) {
        let plugins = self.plugins.clone();
        for plugin in plugins.iter().rev() {
            if plugin.redo(self) == Flow::Handled {
                return;
            }
        }
    }

    pub(crate) fn apply_undo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(previous) = self.history.as_mut().and_then(|h| h.undo(current)) else {
            return false;
        };
        self.restore_snapshot(previous);
        true
    }

    pub(crate) fn apply_redo(&mut self) -> bool {
        let current = self.snapshot();
        let Some(next) = self.history.as_mut().and_then(|h| h.redo(current)) else {
            return false;
        };
        self.restore_snapshot(next);
        true
    }

    // --- Transactions ---

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            value: self.value.clone(),
            selection: self.selection.clone(),
        }
    }

    fn restore_snapshot(&mut self, snapshot: Snapshot) {
        let value_changed = self.value != snapshot.value;
        let selection_changed = self.selection != snapshot.selection;
        self.value = snapshot.value;
        self.selection = snapshot.selection;
        self.pending_marks = None;
        self.validate_selection();
        self.change.value |= value_changed;
        self.change.selection |= selection_changed;
    }

    /// Run `f` as one undoable step. Nested calls join the outermost one.
    pub fn transact<R>(&mut self, kind: ChangeKind, f: impl FnOnce(&mut Self) -> R) -> R {
        if self.depth == 0 {
            self.before = Some(self.snapshot());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        if self.depth == 0 {
            self.finish(kind);
        }
        result
    }

    /// Like [`transact`](Self::transact), but an `Err` from `f` puts the
    /// document and selection back as they were and records no step.
    pub fn try_transact<T, E>(
        &mut self,
        kind: ChangeKind,
        f: impl FnOnce(&mut Self) -> Result<T, E>,
    ) -> Result<T, E> {
        let before = self.snapshot();
        self.transact(kind, |editor| {
            let result = f(editor);
            if result.is_err() {
                editor.value = before.value;
                editor.selection = before.selection;
                editor.pending_marks = None;
            }
            result
        })
    }

    fn finish(&mut self, kind: ChangeKind) {
        let Some(before) = self.before.take() else {
            return;
        };
        self.normalize();
        let value_changed = self.value != before.value;
        let selection_changed = self.selection != before.selection;
        if let Some(history) = &mut self.history {
            if value_changed {
                history.record(before, kind);
            } else if selection_changed {
                history.break_merge();
            }
        }
        if value_changed {
            tracing::trace!(editor = %self.id, ?kind, "document changed");
        }
        self.change.value |= value_changed;
        self.change.selection |= selection_changed;
    }

    fn normalize(&mut self) {
        let captured = self.capture_selection();
        let plugins = self.plugins.clone();
        // depth > 0 keeps selection repairs out of the change flags
        self.depth += 1;
        if self.run_normalize(&plugins)
            && let Some(captured) = captured
        {
            self.restore_selection(captured);
        }
        self.validate_selection();
        self.depth -= 1;
    }

    fn run_normalize(&mut self, plugins: &[Rc<dyn Plugin>]) -> bool {
        let mut dirty = false;
        for _ in 0..MAX_NORMALIZE_PASSES {
            let mut changed = normalize::normalize_base(&mut self.value);
            for plugin in plugins {
                changed |= plugin.normalize(&mut self.value);
            }
            if !changed {
                return dirty;
            }
            dirty = true;
        }
        tracing::warn!(editor = %self.id, "normalization did not settle");
        dirty
    }

    /// Drain the change flags.
    pub fn take_change(&mut self) -> Option<Change> {
        let change = std::mem::take(&mut self.change);
        (change.value || change.selection).then_some(change)
    }
}
