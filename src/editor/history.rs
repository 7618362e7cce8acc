//! Undo/redo history.
//!
//! Steps are whole-document snapshots taken before each outermost
//! transaction. Consecutive typing (or consecutive deleting) collapses into
//! a single step until the selection moves or another kind of change lands.

use crate::document::{Range, Value};

/// Maximum number of undo steps kept.
pub const MAX_STEPS: usize = 100;

/// What produced a change, used to merge consecutive edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Typing,
    Deleting,
    Other,
}

/// Document and selection at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub value: Value,
    pub selection: Option<Range>,
}

#[derive(Debug, Clone)]
struct Step {
    before: Snapshot,
    kind: ChangeKind,
}

#[derive(Debug, Clone, Default)]
pub struct History {
    undos: Vec<Step>,
    redos: Vec<Snapshot>,
    /// Whether the next step of the same kind may merge into the last one.
    merging: bool,
}

impl History {
    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undos.len()
    }

    /// Record the state from before a change.
    pub fn record(&mut self, before: Snapshot, kind: ChangeKind) {
        self.redos.clear();
        let mergeable = kind != ChangeKind::Other;
        if mergeable && self.merging && self.undos.last().is_some_and(|s| s.kind == kind) {
            return;
        }
        self.undos.push(Step { before, kind });
        while self.undos.len() > MAX_STEPS {
            self.undos.remove(0);
        }
        self.merging = mergeable;
    }

    /// Stop merging into the current step.
    pub const fn break_merge(&mut self) {
        self.merging = false;
    }

    /// Pop the last step. `current` becomes the redo target.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let step = self.undos.pop()?;
        self.redos.push(current);
        self.merging = false;
        Some(step.before)
    }

    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redos.pop()?;
        self.undos.push(Step {
            before: current,
            kind: ChangeKind::Other,
        });
        self.merging = false;
        Some(next)
    }

    pub fn clear(&mut self) {
        self.undos.clear();
        self.redos.clear();
        self.merging = false;
    }
}
