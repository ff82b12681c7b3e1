//! Undo/redo bookkeeping.
//!
//! The model does not own its history. It records [`EditStackElement`]s into an
//! [`UndoRedoService`] and, on undo/redo, receives an element back and replays its changes
//! through the normal edit pipeline.

use std::collections::HashMap;

use crate::buffer::TextChange;
use crate::line_ending::EndOfLineSequence;
use crate::position::Selection;

/// Opaque handle to a point in a model's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UndoRedoSnapshot {
    id: u64,
}

impl UndoRedoSnapshot {
    /// Snapshot id.
    pub fn id(&self) -> u64 {
        self.id
    }
}

/// One undoable unit of work on a model.
///
/// Changes are stored per applied batch: undo replays the batches in reverse order, redo in
/// forward order.
#[derive(Debug, Clone, PartialEq)]
pub struct EditStackElement {
    /// Model the element belongs to.
    pub model_id: u32,
    /// Alternative version id before the element.
    pub before_version_id: u64,
    /// Alternative version id after the element.
    pub after_version_id: u64,
    /// EOL before the element.
    pub before_eol: EndOfLineSequence,
    /// EOL after the element.
    pub after_eol: EndOfLineSequence,
    /// Cursor state before the element.
    pub before_cursor_state: Option<Vec<Selection>>,
    /// Cursor state after the element.
    pub after_cursor_state: Option<Vec<Selection>>,
    /// Applied batches, oldest first.
    pub changes: Vec<Vec<TextChange>>,
    open: bool,
}

impl EditStackElement {
    /// Open an element capturing the state before the first change.
    pub fn new(
        model_id: u32,
        before_version_id: u64,
        before_eol: EndOfLineSequence,
        before_cursor_state: Option<Vec<Selection>>,
    ) -> Self {
        Self {
            model_id,
            before_version_id,
            after_version_id: before_version_id,
            before_eol,
            after_eol: before_eol,
            before_cursor_state,
            after_cursor_state: None,
            changes: Vec::new(),
            open: true,
        }
    }

    /// Returns `true` if more changes of `model_id` may still be appended.
    pub fn can_append(&self, model_id: u32) -> bool {
        self.open && self.model_id == model_id
    }

    /// Stop accepting changes.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Record one applied batch.
    pub fn append(
        &mut self,
        changes: Vec<TextChange>,
        after_eol: EndOfLineSequence,
        after_version_id: u64,
        after_cursor_state: Option<Vec<Selection>>,
    ) {
        if !changes.is_empty() {
            self.changes.push(changes);
        }
        self.after_eol = after_eol;
        self.after_version_id = after_version_id;
        self.after_cursor_state = after_cursor_state;
    }
}

/// History storage consumed by a [`TextModel`](crate::TextModel).
pub trait UndoRedoService: Send {
    /// Capture the current history position of a model.
    fn create_snapshot(&mut self, model_id: u32) -> UndoRedoSnapshot;
    /// Roll the history back to a snapshot. Returns `false` for unknown snapshots.
    fn restore_snapshot(&mut self, snapshot: UndoRedoSnapshot) -> bool;
    /// The newest undo element of a model.
    fn last_element_mut(&mut self, model_id: u32) -> Option<&mut EditStackElement>;
    /// Push a new undo element. Clears the model's redo history.
    fn push_element(&mut self, element: EditStackElement);
    /// Move the newest undo element to the redo stack and return it.
    fn undo(&mut self, model_id: u32) -> Option<EditStackElement>;
    /// Move the newest redo element back to the undo stack and return it.
    fn redo(&mut self, model_id: u32) -> Option<EditStackElement>;
    /// Returns `true` if the model has something to undo.
    fn can_undo(&self, model_id: u32) -> bool;
    /// Returns `true` if the model has something to redo.
    fn can_redo(&self, model_id: u32) -> bool;
    /// Drop all history of a model.
    fn remove_elements(&mut self, model_id: u32);
}

#[derive(Debug, Default)]
struct ModelHistory {
    undo_stack: Vec<EditStackElement>,
    redo_stack: Vec<EditStackElement>,
}

/// Bounded, per-model in-memory history.
#[derive(Debug)]
pub struct InMemoryUndoRedoService {
    histories: HashMap<u32, ModelHistory>,
    snapshots: HashMap<u64, (u32, usize)>,
    last_snapshot_id: u64,
    max_undo: usize,
}

impl InMemoryUndoRedoService {
    /// Create a service keeping at most `max_undo` elements per model.
    pub fn new(max_undo: usize) -> Self {
        Self {
            histories: HashMap::new(),
            snapshots: HashMap::new(),
            last_snapshot_id: 0,
            max_undo: max_undo.max(1),
        }
    }

    /// Number of undo elements of a model.
    pub fn undo_depth(&self, model_id: u32) -> usize {
        self.histories
            .get(&model_id)
            .map_or(0, |history| history.undo_stack.len())
    }

    /// Number of redo elements of a model.
    pub fn redo_depth(&self, model_id: u32) -> usize {
        self.histories
            .get(&model_id)
            .map_or(0, |history| history.redo_stack.len())
    }
}

impl Default for InMemoryUndoRedoService {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl UndoRedoService for InMemoryUndoRedoService {
    fn create_snapshot(&mut self, model_id: u32) -> UndoRedoSnapshot {
        self.last_snapshot_id += 1;
        let depth = self.undo_depth(model_id);
        self.snapshots
            .insert(self.last_snapshot_id, (model_id, depth));
        UndoRedoSnapshot {
            id: self.last_snapshot_id,
        }
    }

    fn restore_snapshot(&mut self, snapshot: UndoRedoSnapshot) -> bool {
        let Some(&(model_id, depth)) = self.snapshots.get(&snapshot.id) else {
            return false;
        };
        let history = self.histories.entry(model_id).or_default();
        history.undo_stack.truncate(depth);
        history.redo_stack.clear();
        true
    }

    fn last_element_mut(&mut self, model_id: u32) -> Option<&mut EditStackElement> {
        self.histories.get_mut(&model_id)?.undo_stack.last_mut()
    }

    fn push_element(&mut self, element: EditStackElement) {
        let max_undo = self.max_undo;
        let history = self.histories.entry(element.model_id).or_default();
        history.redo_stack.clear();
        if let Some(last) = history.undo_stack.last_mut() {
            last.close();
        }
        if history.undo_stack.len() >= max_undo {
            history.undo_stack.remove(0);
        }
        history.undo_stack.push(element);
    }

    fn undo(&mut self, model_id: u32) -> Option<EditStackElement> {
        let history = self.histories.get_mut(&model_id)?;
        let mut element = history.undo_stack.pop()?;
        element.close();
        history.redo_stack.push(element.clone());
        Some(element)
    }

    fn redo(&mut self, model_id: u32) -> Option<EditStackElement> {
        let history = self.histories.get_mut(&model_id)?;
        let element = history.redo_stack.pop()?;
        history.undo_stack.push(element.clone());
        Some(element)
    }

    fn can_undo(&self, model_id: u32) -> bool {
        self.undo_depth(model_id) > 0
    }

    fn can_redo(&self, model_id: u32) -> bool {
        self.redo_depth(model_id) > 0
    }

    fn remove_elements(&mut self, model_id: u32) {
        self.histories.remove(&model_id);
        self.snapshots.retain(|_, (owner, _)| *owner != model_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(model_id: u32, version: u64) -> EditStackElement {
        EditStackElement::new(model_id, version, EndOfLineSequence::Lf, None)
    }

    #[test]
    fn test_undo_redo_moves_elements() {
        let mut service = InMemoryUndoRedoService::default();
        service.push_element(element(1, 1));
        service.push_element(element(1, 2));
        service.push_element(element(2, 1));

        assert_eq!(service.undo(1).map(|e| e.before_version_id), Some(2));
        assert!(service.can_redo(1));
        assert!(!service.can_redo(2));
        assert_eq!(service.redo(1).map(|e| e.before_version_id), Some(2));
        assert_eq!(service.undo_depth(1), 2);
    }

    #[test]
    fn test_push_clears_redo_and_closes_previous() {
        let mut service = InMemoryUndoRedoService::default();
        service.push_element(element(1, 1));
        assert!(service.last_element_mut(1).is_some_and(|e| e.can_append(1)));
        service.push_element(element(1, 2));
        service.undo(1);
        service.push_element(element(1, 3));
        assert!(!service.can_redo(1));
        assert_eq!(service.undo_depth(1), 2);
        assert!(service.undo(1).is_some());
        assert!(service.undo(1).is_some_and(|e| !e.can_append(1)));
    }

    #[test]
    fn test_max_undo_drops_oldest() {
        let mut service = InMemoryUndoRedoService::new(2);
        for version in 1..=3 {
            service.push_element(element(1, version));
        }
        assert_eq!(service.undo_depth(1), 2);
        service.undo(1);
        assert_eq!(service.undo(1).map(|e| e.before_version_id), Some(2));
        assert!(service.undo(1).is_none());
    }

    #[test]
    fn test_snapshot_restore_and_remove() {
        let mut service = InMemoryUndoRedoService::default();
        service.push_element(element(1, 1));
        let snapshot = service.create_snapshot(1);
        service.push_element(element(1, 2));
        assert!(service.restore_snapshot(snapshot));
        assert_eq!(service.undo_depth(1), 1);

        service.remove_elements(1);
        assert!(!service.can_undo(1));
        assert!(!service.restore_snapshot(snapshot));
    }

    #[test]
    fn test_append_skips_empty_batches() {
        let mut e = element(1, 1);
        e.append(Vec::new(), EndOfLineSequence::Crlf, 2, None);
        assert!(e.changes.is_empty());
        assert_eq!(e.after_eol, EndOfLineSequence::Crlf);
        assert_eq!(e.after_version_id, 2);
    }
}
