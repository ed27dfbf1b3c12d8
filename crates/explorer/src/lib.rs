//! Parallel explicit-state exploration of a reachable state space.
//!
//! [`explore`] discovers the states reachable from an initial state by distributing
//! [`SuccessorGenerator::successors`] calls over a worker pool that shares an
//! [`IndexedStateSet`] and a [`TodoSet`], following the active-worker-counter termination
//! protocol of the underlying tool this is ported from. [`find_representative`] additionally
//! collapses confluent-tau cycles to a single canonical state.

#![forbid(unsafe_code)]

mod confluence;
mod explorer;
mod indexed_state_set;
mod todo_set;

pub use confluence::*;
pub use explorer::*;
pub use indexed_state_set::*;
pub use todo_set::*;
