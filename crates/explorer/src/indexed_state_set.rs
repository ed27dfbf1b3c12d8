use std::hash::Hash;

use parking_lot::Mutex;
use symck_collections::IndexedSet;
use symck_collections::SetIndex;

/// Thread-safe table assigning a unique, stable index to every discovered state.
///
/// Mirrors `explorer::m_state_numbers` guarded by `m_exclusive_state_access` in the original
/// tool: insertion and lookup both take a single lock, kept short so workers spend as little
/// time as possible blocked on it.
pub struct IndexedStateSet<S> {
    states: Mutex<IndexedSet<S>>,
}

impl<S: Eq + Hash + Clone> Default for IndexedStateSet<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Eq + Hash + Clone> IndexedStateSet<S> {
    pub fn new() -> Self {
        IndexedStateSet {
            states: Mutex::new(IndexedSet::new()),
        }
    }

    /// Inserts `state`, returning its index and whether it was newly discovered.
    pub fn insert(&self, state: S) -> (SetIndex, bool) {
        self.states.lock().insert(state)
    }

    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a clone of the state stored at `index`.
    pub fn get(&self, index: SetIndex) -> S {
        self.states
            .lock()
            .get(index)
            .expect("index was returned by insert() on this table")
            .clone()
    }

    /// Returns a clone of every discovered state, in insertion order.
    pub fn to_vec(&self) -> Vec<S> {
        self.states.lock().to_vec()
    }
}
