//! Snapshot-based undo shared by every format. Depth is unlimited.

use serde::{Deserialize, Serialize};

/// Stack of full prior states; the top is the state before the latest change.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UndoStack<T> {
    entries: Vec<T>,
}

impl<T> Default for UndoStack<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> UndoStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a stored stack (oldest first).
    pub fn from_vec(entries: Vec<T>) -> Self {
        Self { entries }
    }

    /// Save a prior state to return to later.
    pub fn push(&mut self, state: T) {
        self.entries.push(state);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.entries.pop()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest first.
    pub fn as_slice(&self) -> &[T] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_reverse_push_order() {
        let mut s = UndoStack::new();
        s.push(1);
        s.push(2);
        assert_eq!(s.len(), 2);
        assert_eq!(s.pop(), Some(2));
        assert_eq!(s.pop(), Some(1));
        assert_eq!(s.pop(), None);
        assert!(s.is_empty());
    }

    #[test]
    fn restored_stack_pops_newest_first() {
        let mut s = UndoStack::from_vec(vec!["setup", "first", "second"]);
        assert_eq!(s.as_slice().first(), Some(&"setup"));
        assert_eq!(s.pop(), Some("second"));
    }
}
