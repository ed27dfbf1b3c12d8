use std::hash::Hash;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::time::Duration;

use log::debug;
use log::info;
use parking_lot::Mutex;

use crate::IndexedStateSet;
use crate::TodoSet;

/// A discovered transition: predecessor index, action label, successor index.
pub struct Transition<A> {
    pub source: usize,
    pub action: A,
    pub target: usize,
}

/// The transition relation of the system under exploration, supplied by the caller.
///
/// Computing the successors of a state typically means rewriting a summand's guard under a
/// substitution binding the state's process parameters and enumerating solutions for its
/// existentially quantified variables; like the rewriter/enumerator pair it sits on, the
/// explorer treats that as an external collaborator invoked once per visited state.
pub trait SuccessorGenerator: Sync {
    type State: Clone + Eq + Hash + Send;
    type Action: Clone + Send;

    /// Calls `yield_transition` once for every outgoing transition of `state`.
    fn successors(&self, state: &Self::State, yield_transition: &mut dyn FnMut(Self::Action, Self::State));
}

/// The discipline used to order the shared todo-set, selecting which [`TodoSet`] variant
/// [`explore`] constructs.
#[derive(Clone, Copy)]
pub enum TodoKind {
    Breadth,
    Depth,
    Highway(usize),
}

/// Configuration for [`explore`].
pub struct ExplorerOptions {
    /// Number of worker threads sharing the todo-set and discovered-state table.
    pub workers: usize,
    pub todo: TodoKind,
}

impl Default for ExplorerOptions {
    fn default() -> Self {
        ExplorerOptions {
            workers: 1,
            todo: TodoKind::Breadth,
        }
    }
}

/// Explores the reachable state space of `generator` from `initial`, distributing work over
/// `options.workers` worker threads that share a single todo-set and discovered-state table.
///
/// Grounded on `explorer::generate_state_space_thread`'s active-worker-counter termination
/// protocol: a worker that finds the shared todo-set empty decrements the active-worker count
/// and backs off; if the count is still nonzero once it wakes it rejoins, since another worker
/// may have inserted new states into the todo-set in the meantime. Exploration only ends once
/// every worker has observed an empty todo-set with the active count at zero.
pub fn explore<G: SuccessorGenerator>(generator: &G, initial: G::State, options: &ExplorerOptions) -> (IndexedStateSet<G::State>, Vec<Transition<G::Action>>) {
    let discovered = IndexedStateSet::new();
    discovered.insert(initial.clone());

    let todo = Mutex::new(match options.todo {
        TodoKind::Breadth => TodoSet::breadth_first(initial),
        TodoKind::Depth => TodoSet::depth_first(initial),
        TodoKind::Highway(capacity) => TodoSet::highway(initial, capacity),
    });
    let transitions: Mutex<Vec<Transition<G::Action>>> = Mutex::new(Vec::new());
    let active = AtomicUsize::new(options.workers.max(1));

    std::thread::scope(|scope| {
        for worker in 0..options.workers.max(1) {
            scope.spawn(|| worker_loop(worker, generator, &discovered, &todo, &transitions, &active));
        }
    });

    let transitions = transitions.into_inner();
    info!("explored {} states and {} transitions", discovered.len(), transitions.len());
    (discovered, transitions)
}

/// Body of a single worker, run on its own thread by [`explore`].
///
/// Guarding `todo` is the only exclusive section: generating a state's successors and
/// recording its transitions happens outside the lock, matching the two short
/// `m_exclusive_state_access`/`m_exclusive_transition_access` critical sections of the
/// original rather than one held for the whole state.
fn worker_loop<G: SuccessorGenerator>(
    worker: usize,
    generator: &G,
    discovered: &IndexedStateSet<G::State>,
    todo: &Mutex<TodoSet<G::State>>,
    transitions: &Mutex<Vec<Transition<G::Action>>>,
    active: &AtomicUsize,
) {
    debug!("starting worker {worker}");
    while active.load(Ordering::SeqCst) > 0 {
        loop {
            let state = match todo.lock().choose() {
                Some(state) => state,
                None => break,
            };

            let source = discovered.insert(state.clone()).0;
            generator.successors(&state, &mut |action, successor| {
                let (target, is_new) = discovered.insert(successor.clone());
                if is_new {
                    todo.lock().insert(successor);
                }
                transitions.lock().push(Transition {
                    source: *source,
                    action,
                    target: *target,
                });
            });

            todo.lock().finish_state();
        }

        active.fetch_sub(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        if active.load(Ordering::SeqCst) > 0 {
            active.fetch_add(1, Ordering::SeqCst);
        }
    }
    debug!("stopping worker {worker}");
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter;

    impl SuccessorGenerator for Counter {
        type State = u32;
        type Action = ();

        fn successors(&self, state: &u32, yield_transition: &mut dyn FnMut((), u32)) {
            if *state < 3 {
                yield_transition((), state + 1);
            }
        }
    }

    #[test]
    fn test_single_worker_explores_every_reachable_state() {
        let options = ExplorerOptions { workers: 1, todo: TodoKind::Breadth };
        let (discovered, transitions) = explore(&Counter, 0, &options);

        assert_eq!(discovered.len(), 4);
        assert_eq!(transitions.len(), 3);
    }

    #[test]
    fn test_multiple_workers_agree_on_reachable_state_count() {
        let options = ExplorerOptions { workers: 4, todo: TodoKind::Breadth };
        let (discovered, transitions) = explore(&Counter, 0, &options);

        assert_eq!(discovered.len(), 4);
        assert_eq!(transitions.len(), 3);
    }

    #[test]
    fn test_depth_first_and_highway_agree_on_reachable_state_count() {
        for todo in [TodoKind::Depth, TodoKind::Highway(2)] {
            let options = ExplorerOptions { workers: 2, todo };
            let (discovered, _transitions) = explore(&Counter, 0, &options);
            assert_eq!(discovered.len(), 4);
        }
    }
}
