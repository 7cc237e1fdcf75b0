//! Bounded undo/redo history built from whole-document snapshots.
//!
//! Every mutating edit calls [`SnapshotHistory::record`] with the document as it
//! is right before the change. Undo and redo swap stored snapshots with the live
//! document. History is linear: recording after an undo drops the redo branch.

use std::collections::VecDeque;

use tracing::{debug, trace};

/// Undo depth used when no explicit capacity is configured.
pub const DEFAULT_MAX_LEVELS: usize = 50;

/// Produces an independent copy of a document for storage in the history.
///
/// Implementations must be total and free of side effects: a stored snapshot
/// may never share mutable state with the value it was taken from.
pub trait Snapshot {
    fn snapshot(&self) -> Self;
}

impl Snapshot for String {
    fn snapshot(&self) -> Self {
        self.clone()
    }
}

impl<T: Clone> Snapshot for Vec<T> {
    fn snapshot(&self) -> Self {
        self.clone()
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotHistory<T> {
    undo_stack: VecDeque<T>,
    redo_stack: Vec<T>,
    max_levels: usize,
}

impl<T: Snapshot> Default for SnapshotHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEVELS)
    }
}

impl<T: Snapshot> SnapshotHistory<T> {
    /// Creates an empty history retaining at most `max_levels` undo entries.
    /// A capacity of zero is treated as one.
    pub fn new(max_levels: usize) -> Self {
        let max_levels = max_levels.max(1);
        Self {
            undo_stack: VecDeque::with_capacity(max_levels),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Drops both stacks. Called when a new document replaces the current one.
    pub fn clear(&mut self) {
        debug!(
            undo = self.undo_stack.len(),
            redo = self.redo_stack.len(),
            "history cleared"
        );
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Pushes a snapshot of `current` as the newest undo step, evicting the
    /// oldest step once `max_levels` is exceeded, and discards any redo branch.
    pub fn record(&mut self, current: &T) {
        self.push_undo(current.snapshot());
        if !self.redo_stack.is_empty() {
            trace!(dropped = self.redo_stack.len(), "redo branch discarded");
            self.redo_stack.clear();
        }
    }

    /// Returns the state preceding `current`, or `None` when there is nothing
    /// to undo. `current` is kept for a later [`redo`](Self::redo).
    pub fn undo(&mut self, current: &T) -> Option<T> {
        let prev = self.undo_stack.pop_back()?;
        self.redo_stack.push(current.snapshot());
        Some(prev)
    }

    /// Returns the state most recently undone from `current`, or `None` when
    /// there is nothing to redo.
    pub fn redo(&mut self, current: &T) -> Option<T> {
        let next = self.redo_stack.pop()?;
        self.push_undo(current.snapshot());
        Some(next)
    }

    /// Like [`undo`](Self::undo), but swaps the restored state into `doc` and
    /// moves the replaced value onto the redo stack without snapshotting it.
    /// Returns `false`, leaving `doc` alone, when the undo stack is empty.
    pub fn undo_in_place(&mut self, doc: &mut T) -> bool {
        match self.undo_stack.pop_back() {
            Some(prev) => {
                let current = std::mem::replace(doc, prev);
                self.redo_stack.push(current);
                true
            }
            None => false,
        }
    }

    /// Counterpart of [`undo_in_place`](Self::undo_in_place). The displaced
    /// value goes back onto the undo stack, subject to the same eviction as
    /// [`record`](Self::record).
    pub fn redo_in_place(&mut self, doc: &mut T) -> bool {
        match self.redo_stack.pop() {
            Some(next) => {
                let current = std::mem::replace(doc, next);
                self.push_undo(current);
                true
            }
            None => false,
        }
    }

    fn push_undo(&mut self, snapshot: T) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.max_levels {
            self.undo_stack.pop_front();
            trace!(max_levels = self.max_levels, "oldest snapshot evicted");
        }
    }

    #[cfg(test)]
    pub(crate) fn undo_entries(&self) -> impl Iterator<Item = &T> {
        self.undo_stack.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Doc = Vec<&'static str>;

    fn doc(s: &'static str) -> Doc {
        vec![s]
    }

    #[test]
    fn undo_walks_back_then_redo_replays() {
        let mut h: SnapshotHistory<Doc> = SnapshotHistory::default();
        let d0 = doc("d0");
        let d1 = doc("d1");
        let d2 = doc("d2");

        h.record(&d0);
        h.record(&d1);

        assert_eq!(h.undo(&d2), Some(d1.clone()));
        assert_eq!(h.undo(&d1), Some(d0.clone()));
        assert_eq!(h.undo(&d0), None);

        assert_eq!(h.redo(&d0), Some(d1.clone()));
        assert_eq!(h.redo(&d1), Some(d2.clone()));
        assert_eq!(h.redo(&d2), None);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut h: SnapshotHistory<Doc> = SnapshotHistory::new(2);
        h.record(&doc("a"));
        h.record(&doc("b"));
        h.record(&doc("c"));

        let kept: Vec<_> = h.undo_entries().cloned().collect();
        assert_eq!(kept, vec![doc("b"), doc("c")]);

        let live = doc("d");
        assert_eq!(h.undo(&live), Some(doc("c")));
        assert_eq!(h.undo(&doc("c")), Some(doc("b")));
        assert_eq!(h.undo(&doc("b")), None);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut h: SnapshotHistory<Doc> = SnapshotHistory::new(0);
        assert_eq!(h.max_levels(), 1);
        h.record(&doc("a"));
        h.record(&doc("b"));
        assert_eq!(h.undo_depth(), 1);
    }

    #[test]
    fn record_discards_redo_branch() {
        let mut h: SnapshotHistory<Doc> = SnapshotHistory::default();
        h.record(&doc("a"));
        assert!(h.undo(&doc("b")).is_some());
        assert!(h.can_redo());

        h.record(&doc("a"));
        assert!(!h.can_redo());
        assert_eq!(h.redo(&doc("c")), None);
    }

    #[test]
    fn undo_on_empty_leaves_redo_alone() {
        let mut h: SnapshotHistory<Doc> = SnapshotHistory::default();
        h.record(&doc("a"));
        assert_eq!(h.undo(&doc("b")), Some(doc("a")));
        assert_eq!(h.redo_depth(), 1);

        assert_eq!(h.undo(&doc("a")), None);
        assert_eq!(h.redo_depth(), 1);
    }

    #[test]
    fn redo_respects_capacity() {
        let mut h: SnapshotHistory<Doc> = SnapshotHistory::new(1);
        h.record(&doc("a"));
        let restored = h.undo(&doc("b")).unwrap();
        assert_eq!(restored, doc("a"));
        assert_eq!(h.undo_depth(), 0);
        assert_eq!(h.redo(&restored), Some(doc("b")));
        assert_eq!(h.undo_depth(), 1);
    }

    #[test]
    fn restored_document_is_independent_of_stored_snapshot() {
        let mut h: SnapshotHistory<Vec<String>> = SnapshotHistory::default();
        let before = vec!["x".to_string()];
        h.record(&before);

        let mut live = h.undo(&vec!["y".to_string()]).unwrap();
        live.push("mutated".into());

        let replay = h.redo(&live).unwrap();
        assert_eq!(replay, vec!["y".to_string()]);
        assert_eq!(h.undo(&replay), Some(vec!["x".to_string(), "mutated".to_string()]));
    }

    #[test]
    fn in_place_variants_swap_documents() {
        let mut h: SnapshotHistory<String> = SnapshotHistory::default();
        let mut live = String::from("one");
        h.record(&live);
        live.push_str(" two");

        assert!(h.undo_in_place(&mut live));
        assert_eq!(live, "one");
        assert!(!h.undo_in_place(&mut live));

        assert!(h.redo_in_place(&mut live));
        assert_eq!(live, "one two");
        assert!(!h.redo_in_place(&mut live));
        assert!(h.can_undo());
    }

    #[test]
    fn clear_resets_both_stacks() {
        let mut h: SnapshotHistory<String> = SnapshotHistory::default();
        h.record(&"a".to_string());
        h.record(&"b".to_string());
        let _ = h.undo(&"c".to_string());
        h.clear();
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
