use std::collections::VecDeque;

use rand::Rng;

/// The order in which discovered-but-unprocessed states are handed back out to workers.
///
/// Mirrors the `breadth_first_todo_set` / `depth_first_todo_set` / `highway_todo_set`
/// hierarchy: all three share `choose`/`insert`/`finish_state`, differing only in which state
/// `choose` returns next and how `insert` reacts to a full reservoir.
pub enum TodoSet<S> {
    /// First-in-first-out: explores the state space level by level.
    Breadth(VecDeque<S>),
    /// Last-in-first-out: explores one path as deep as possible before backtracking.
    Depth(Vec<S>),
    /// Reservoir-samples at most `capacity` states per BFS layer, bounding memory on wide
    /// state spaces at the cost of exploring only a random subset of each layer.
    Highway {
        queue: VecDeque<S>,
        capacity: usize,
        /// Number of states offered to the current layer's reservoir so far.
        inserted: usize,
        /// Number of states from the current layer still to be processed before the next
        /// layer's reservoir reopens.
        remaining_in_layer: usize,
    },
}

impl<S> TodoSet<S> {
    pub fn breadth_first(init: S) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(init);
        TodoSet::Breadth(queue)
    }

    pub fn depth_first(init: S) -> Self {
        TodoSet::Depth(vec![init])
    }

    pub fn highway(init: S, capacity: usize) -> Self {
        let mut queue = VecDeque::new();
        queue.push_back(init);
        TodoSet::Highway {
            queue,
            capacity,
            inserted: 0,
            remaining_in_layer: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        match self {
            TodoSet::Breadth(q) => q.len(),
            TodoSet::Depth(v) => v.len(),
            TodoSet::Highway { queue, .. } => queue.len(),
        }
    }

    /// Removes and returns the next state to process.
    pub fn choose(&mut self) -> Option<S> {
        match self {
            TodoSet::Breadth(q) => q.pop_front(),
            TodoSet::Depth(v) => v.pop(),
            TodoSet::Highway { queue, .. } => queue.pop_front(),
        }
    }

    /// Offers a newly discovered successor state for exploration.
    pub fn insert(&mut self, state: S) {
        match self {
            TodoSet::Breadth(q) => q.push_back(state),
            TodoSet::Depth(v) => v.push(state),
            TodoSet::Highway {
                queue,
                capacity,
                inserted,
                ..
            } => {
                *inserted += 1;
                if *inserted <= *capacity {
                    queue.push_back(state);
                } else {
                    let k = rand::rng().random_range(1..=*inserted);
                    if k <= *capacity {
                        let len = queue.len();
                        queue[len - k] = state;
                    }
                }
            }
        }
    }

    /// Signals that one state from the current layer has finished generating its successors;
    /// once every state in the layer has finished, the reservoir for the next layer reopens.
    pub fn finish_state(&mut self) {
        if let TodoSet::Highway {
            queue,
            inserted,
            remaining_in_layer,
            ..
        } = self
        {
            *remaining_in_layer -= 1;
            if *remaining_in_layer == 0 {
                *remaining_in_layer = queue.len();
                *inserted = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breadth_first_order() {
        let mut todo = TodoSet::breadth_first(0);
        todo.insert(1);
        todo.insert(2);
        assert_eq!(todo.choose(), Some(0));
        assert_eq!(todo.choose(), Some(1));
        assert_eq!(todo.choose(), Some(2));
        assert_eq!(todo.choose(), None);
    }

    #[test]
    fn test_depth_first_order() {
        let mut todo = TodoSet::depth_first(0);
        todo.insert(1);
        todo.insert(2);
        assert_eq!(todo.choose(), Some(2));
        assert_eq!(todo.choose(), Some(1));
        assert_eq!(todo.choose(), Some(0));
    }

    #[test]
    fn test_highway_bounds_reservoir_size() {
        let mut todo = TodoSet::highway(0, 2);
        for s in 1..10 {
            todo.insert(s);
        }
        assert_eq!(todo.len(), 2);
    }
}
