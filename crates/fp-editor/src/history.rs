//! Undo/redo history of full-document snapshots.
//!
//! Every logical edit pushes the state captured *before* it. Undo swaps the
//! current state onto the redo stack and hands back the previous one for
//! the editor to restore; redo is symmetric. Gestures and compound edits use
//! batching: the state at `begin_batch` becomes a single undo step when the
//! outermost batch closes, and only if something changed.

use fp_core::Snapshot;

/// One undo step.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub snapshot: Snapshot,
    /// What the step undoes, for logs and menu labels.
    pub label: String,
}

/// Bounded undo stack with an unbounded redo stack.
#[derive(Debug)]
pub struct History {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    /// Maximum undo depth; the oldest entry is dropped beyond it.
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    /// State captured when the outermost batch opened.
    batch_snapshot: Option<Snapshot>,
    batch_label: String,
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth.min(64)),
            redo_stack: Vec::new(),
            max_depth: max_depth.max(1),
            batch_depth: 0,
            batch_snapshot: None,
            batch_label: String::new(),
        }
    }

    /// Record the state before a logical edit and clear redo.
    ///
    /// Inside a batch this is a no-op; the batch start already holds the
    /// state to return to.
    pub fn before_edit(&mut self, current: Snapshot, label: &str) {
        if self.batch_depth > 0 {
            return;
        }
        self.push(HistoryEntry {
            snapshot: current,
            label: label.to_string(),
        });
        self.redo_stack.clear();
    }

    /// Pop the entry pushed by a `before_edit` whose edit then failed.
    pub fn discard_last(&mut self) -> Option<HistoryEntry> {
        if self.batch_depth > 0 {
            return None;
        }
        self.undo_stack.pop()
    }

    /// Step back. `current` goes onto the redo stack; the returned
    /// snapshot is what the editor must restore.
    pub fn undo(&mut self, current: Snapshot) -> Option<HistoryEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(HistoryEntry {
            snapshot: current,
            label: entry.label.clone(),
        });
        Some(entry)
    }

    /// Entry the next `undo` would return.
    pub fn peek_undo(&self) -> Option<&HistoryEntry> {
        self.undo_stack.last()
    }

    pub fn peek_redo(&self) -> Option<&HistoryEntry> {
        self.redo_stack.last()
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: Snapshot) -> Option<HistoryEntry> {
        let entry = self.redo_stack.pop()?;
        self.push(HistoryEntry {
            snapshot: current,
            label: entry.label.clone(),
        });
        Some(entry)
    }

    /// Start a batch group. Only the outermost call captures state.
    pub fn begin_batch(&mut self, current: Snapshot, label: &str) {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(current);
            self.batch_label = label.to_string();
        }
        self.batch_depth += 1;
    }

    /// End a batch group. When the outermost batch closes and `current`
    /// differs from the captured state, push one undo step and clear redo.
    /// Returns whether a step was pushed.
    pub fn end_batch(&mut self, current: &Snapshot) -> bool {
        if self.batch_depth == 0 {
            return false;
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return false;
        }
        let Some(before) = self.batch_snapshot.take() else {
            return false;
        };
        if before == *current {
            return false;
        }
        let label = std::mem::take(&mut self.batch_label);
        self.push(HistoryEntry {
            snapshot: before,
            label,
        });
        self.redo_stack.clear();
        true
    }

    pub fn is_batching(&self) -> bool {
        self.batch_depth > 0
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the step `undo` would revert.
    pub fn undo_label(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().map(|e| e.label.as_str())
    }

    /// Forget everything, including an open batch.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_label.clear();
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::{DeviceId, DeviceRegistry};

    /// A distinguishable snapshot: `n` devices.
    fn state(n: usize) -> Snapshot {
        let mut reg = DeviceRegistry::new();
        for i in 0..n {
            reg.create(DeviceId::intern(&i.to_string()), "D", 0.0, 0.0, 1)
                .unwrap();
        }
        Snapshot::capture(&reg, None)
    }

    #[test]
    fn peek_leaves_stacks_alone() {
        let mut h = History::new(50);
        assert!(h.peek_undo().is_none());
        h.before_edit(state(0), "create");
        assert_eq!(h.peek_undo().map(|e| e.label.as_str()), Some("create"));
        assert_eq!(h.undo_depth(), 1);

        h.undo(state(1));
        assert_eq!(h.peek_redo().map(|e| &e.snapshot), Some(&state(1)));
        assert_eq!(h.redo_depth(), 1);
    }

    #[test]
    fn undo_redo_swap_states() {
        let mut h = History::new(50);
        h.before_edit(state(0), "create");
        // live state is now state(1)
        let back = h.undo(state(1)).unwrap();
        assert_eq!(back.snapshot, state(0));
        assert_eq!(back.label, "create");
        assert!(h.can_redo());
        let forward = h.redo(state(0)).unwrap();
        assert_eq!(forward.snapshot, state(1));
        assert!(!h.can_redo());
        assert!(h.can_undo());
    }

    #[test]
    fn empty_stacks_return_none() {
        let mut h = History::new(50);
        assert!(h.undo(state(0)).is_none());
        assert!(h.redo(state(0)).is_none());
        assert!(!h.can_redo());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut h = History::new(50);
        h.before_edit(state(0), "a");
        h.undo(state(1));
        assert!(h.can_redo());
        h.before_edit(state(0), "b");
        assert!(!h.can_redo());
    }

    #[test]
    fn depth_is_capped_oldest_first() {
        let mut h = History::new(3);
        for i in 0..5 {
            h.before_edit(state(i), "edit");
        }
        assert_eq!(h.undo_depth(), 3);
        let mut restored = Vec::new();
        while let Some(entry) = h.undo(state(99)) {
            restored.push(entry.snapshot.devices.len());
        }
        assert_eq!(restored, vec![4, 3, 2]);
    }

    #[test]
    fn discard_last_drops_speculative_entry() {
        let mut h = History::new(50);
        h.before_edit(state(0), "create");
        assert!(h.discard_last().is_some());
        assert!(!h.can_undo());
    }

    #[test]
    fn batch_collapses_to_one_step() {
        let mut h = History::new(50);
        h.begin_batch(state(0), "drag");
        h.before_edit(state(1), "inner");
        h.begin_batch(state(1), "nested");
        assert!(!h.end_batch(&state(2)));
        assert!(h.is_batching());
        assert!(h.end_batch(&state(3)));
        assert_eq!(h.undo_depth(), 1);
        assert_eq!(h.undo_label(), Some("drag"));
        assert_eq!(h.undo(state(3)).unwrap().snapshot, state(0));
    }

    #[test]
    fn unchanged_batch_pushes_nothing() {
        let mut h = History::new(50);
        h.before_edit(state(0), "a");
        h.undo(state(1));
        h.begin_batch(state(0), "noop");
        assert!(!h.end_batch(&state(0)));
        assert_eq!(h.undo_depth(), 0);
        // An empty batch is not a new edit, so redo survives.
        assert!(h.can_redo());
    }

    #[test]
    fn unbalanced_end_is_ignored() {
        let mut h = History::new(50);
        assert!(!h.end_batch(&state(0)));
        assert!(!h.is_batching());
    }
}
