//! Cursor movement over text blocks.
//!
//! Positions are flattened to (block ordinal, offset), so movement steps
//! across leaf and element boundaries without special cases. Up/Down move
//! between blocks; visual line movement is the renderer's job since only it
//! knows the wrap width.

use crate::document::path::{Affinity, block_len, element_at};
use crate::document::Range;

use super::transforms::{word_end_after, word_start_before};
use super::{BlockCursor, Editor};

/// Direction for cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Editor {
    fn block_len_at(&self, ordinal: usize) -> usize {
        self.text_blocks()
            .get(ordinal)
            .map_or(0, |path| block_len(&self.value, path))
    }

    fn block_chars(&self, ordinal: usize) -> Vec<char> {
        self.text_blocks()
            .get(ordinal)
            .and_then(|path| element_at(&self.value, path))
            .map(|el| el.string().chars().collect())
            .unwrap_or_default()
    }

    fn focus_cursor(&self) -> Option<BlockCursor> {
        self.block_cursor(&self.selection.as_ref()?.focus)
    }

    /// Move the focus to `target`; the anchor follows unless `extend`.
    pub(crate) fn move_focus_to(&mut self, target: BlockCursor, extend: bool) {
        let Some(point) = self.point_for(target, Affinity::Backward) else {
            return;
        };
        let range = match (&self.selection, extend) {
            (Some(selection), true) => Range::new(selection.anchor.clone(), point),
            _ => Range::collapsed(point),
        };
        self.set_selection(Some(range));
    }

    pub fn move_cursor(&mut self, direction: Direction, extend: bool) {
        let Some(selection) = self.selection.clone() else {
            self.move_to_start();
            return;
        };
        if !extend && selection.is_expanded() {
            if let Direction::Left | Direction::Right = direction {
                let point = if direction == Direction::Left {
                    selection.start()
                } else {
                    selection.end()
                };
                self.set_selection(Some(Range::collapsed(point)));
                return;
            }
        }
        let Some(cursor) = self.focus_cursor() else {
            return;
        };
        let count = self.text_blocks().len();
        let len = self.block_len_at(cursor.ordinal);
        let target = match direction {
            Direction::Left if cursor.offset > 0 => BlockCursor {
                offset: cursor.offset - 1,
                ..cursor
            },
            Direction::Left if cursor.ordinal > 0 => BlockCursor {
                ordinal: cursor.ordinal - 1,
                offset: self.block_len_at(cursor.ordinal - 1),
            },
            Direction::Right if cursor.offset < len => BlockCursor {
                offset: cursor.offset + 1,
                ..cursor
            },
            Direction::Right if cursor.ordinal + 1 < count => BlockCursor {
                ordinal: cursor.ordinal + 1,
                offset: 0,
            },
            Direction::Up if cursor.ordinal > 0 => BlockCursor {
                ordinal: cursor.ordinal - 1,
                offset: cursor.offset.min(self.block_len_at(cursor.ordinal - 1)),
            },
            Direction::Up => BlockCursor {
                ordinal: 0,
                offset: 0,
            },
            Direction::Down if cursor.ordinal + 1 < count => BlockCursor {
                ordinal: cursor.ordinal + 1,
                offset: cursor.offset.min(self.block_len_at(cursor.ordinal + 1)),
            },
            Direction::Down => BlockCursor { offset: len, ..cursor },
            Direction::Left | Direction::Right => cursor,
        };
        self.move_focus_to(target, extend);
    }

    /// Start of the current block.
    pub fn move_home(&mut self, extend: bool) {
        if let Some(cursor) = self.focus_cursor() {
            self.move_focus_to(BlockCursor { offset: 0, ..cursor }, extend);
        }
    }

    /// End of the current block.
    pub fn move_end(&mut self, extend: bool) {
        if let Some(cursor) = self.focus_cursor() {
            let offset = self.block_len_at(cursor.ordinal);
            self.move_focus_to(BlockCursor { offset, ..cursor }, extend);
        }
    }

    pub fn move_word_left(&mut self, extend: bool) {
        let Some(cursor) = self.focus_cursor() else {
            return;
        };
        if cursor.offset == 0 {
            self.move_cursor(Direction::Left, extend);
            return;
        }
        let offset = word_start_before(&self.block_chars(cursor.ordinal), cursor.offset);
        self.move_focus_to(BlockCursor { offset, ..cursor }, extend);
    }

    pub fn move_word_right(&mut self, extend: bool) {
        let Some(cursor) = self.focus_cursor() else {
            return;
        };
        let chars = self.block_chars(cursor.ordinal);
        if cursor.offset >= chars.len() {
            self.move_cursor(Direction::Right, extend);
            return;
        }
        let offset = word_end_after(&chars, cursor.offset);
        self.move_focus_to(BlockCursor { offset, ..cursor }, extend);
    }

    pub fn move_to_start(&mut self) {
        self.move_focus_to(
            BlockCursor {
                ordinal: 0,
                offset: 0,
            },
            false,
        );
    }

    pub fn move_to_end(&mut self) {
        self.move_focus_to(
            BlockCursor {
                ordinal: usize::MAX,
                offset: usize::MAX,
            },
            false,
        );
    }

    pub fn select_all(&mut self) {
        self.move_to_start();
        self.move_focus_to(
            BlockCursor {
                ordinal: usize::MAX,
                offset: usize::MAX,
            },
            true,
        );
    }

    /// Place the cursor at a char offset of the `ordinal`-th text block, as
    /// resolved by a renderer from a screen position.
    pub fn select_block_position(&mut self, ordinal: usize, offset: usize, extend: bool) {
        self.move_focus_to(BlockCursor { ordinal, offset }, extend);
    }

    /// Focus as (text block ordinal, offset), for renderers.
    pub fn focus_position(&self) -> Option<(usize, usize)> {
        self.focus_cursor().map(|c| (c.ordinal, c.offset))
    }

    /// Anchor as (text block ordinal, offset), for renderers.
    pub fn anchor_position(&self) -> Option<(usize, usize)> {
        let cursor = self.block_cursor(&self.selection.as_ref()?.anchor)?;
        Some((cursor.ordinal, cursor.offset))
    }
}
