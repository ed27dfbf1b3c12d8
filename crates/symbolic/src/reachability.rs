use log::info;
use symck_io::TimeProgress;
use symck_ldd::Ldd;
use symck_ldd::Storage;
use symck_ldd::Value;
use symck_ldd::len;
use symck_ldd::minus;
use symck_ldd::project;
use symck_ldd::relational_product;
use symck_ldd::union;
use symck_utilities::SymckError;
use thiserror::Error;

use crate::SummandGroup;
use crate::SymbolicLts;

/// Performs reachability analysis on a symbolic LTS whose transition relations have
/// already been computed (e.g. read from a Sylvan-format `.sym` file).
///
/// Returns the number of reachable states. If `detect_deadlocks` is set, also returns
/// the LDD of states reached during the search that have no outgoing transition in
/// any summand group.
pub fn reachability(storage: &mut Storage, lts: &SymbolicLts, detect_deadlocks: bool) -> Result<Reachable, SymckError> {
    let mut todo = lts.initial_state().clone();
    let mut states = lts.initial_state().clone();
    let mut deadlocks = storage.empty_set().clone();
    let mut iteration = 0;

    let progress = TimeProgress::new(
        |iteration: usize| {
            info!("Iteration {}", iteration);
        },
        1,
    );

    while todo != *storage.empty_set() {
        let todo_before = todo.clone();

        let mut next = storage.empty_set().clone();
        for group in lts.summand_groups() {
            let result = relational_product(storage, &todo, group.relation(), group.meta());
            next = union(storage, &next, &result);
        }

        if detect_deadlocks {
            let stuck = minus(storage, &todo_before, &enabled(storage, &todo_before, lts.summand_groups()));
            deadlocks = union(storage, &deadlocks, &stuck);
        }

        todo = minus(storage, &next, &states);
        states = union(storage, &states, &todo);
        progress.print(iteration);
        iteration += 1;
    }

    Ok(Reachable {
        states,
        state_count: len(storage, &states),
        deadlocks: detect_deadlocks.then_some(deadlocks),
    })
}

/// The result of a reachability run.
pub struct Reachable {
    states: Ldd,
    state_count: usize,
    deadlocks: Option<Ldd>,
}

impl Reachable {
    /// Constructs a reachability result directly, e.g. from a symbolic LTS read whole from
    /// disk rather than computed by [`reachability`].
    pub fn new(states: Ldd, state_count: usize, deadlocks: Option<Ldd>) -> Self {
        Self { states, state_count, deadlocks }
    }

    /// Returns the LDD of reachable states.
    pub fn states(&self) -> &Ldd {
        &self.states
    }

    /// Returns the number of reachable states.
    pub fn state_count(&self) -> usize {
        self.state_count
    }

    /// Returns the LDD of deadlock states, if deadlock detection was requested.
    pub fn deadlocks(&self) -> Option<&Ldd> {
        self.deadlocks.as_ref()
    }
}

/// Exploration knobs for [`reachability_with_learning`].
///
/// `cached` and `global_cache` control how much of a group's read-projection is skipped as
/// already-learned: with `cached` off every iteration relearns from scratch; with it on (the
/// default) a group only relearns `proj_G - Ldomain(G)` (or, with `global_cache`, the read-vectors
/// any group has already learned, sharing the cache across groups that read overlapping
/// parameters). `chaining` feeds a group's freshly learned transitions into the groups that come
/// after it within the same iteration rather than waiting for the next one. `saturation` reapplies
/// a single group to its own local fixpoint before moving to the next group. `max_iterations`
/// bounds the number of outer iterations, for a caller content with an incomplete result rather
/// than paying for full exploration.
#[derive(Clone, Copy, Debug)]
pub struct SymbolicReachabilityOptions {
    pub cached: bool,
    pub global_cache: bool,
    pub chaining: bool,
    pub saturation: bool,
    pub detect_deadlocks: bool,
    pub max_iterations: Option<usize>,
}

impl Default for SymbolicReachabilityOptions {
    fn default() -> Self {
        SymbolicReachabilityOptions {
            cached: true,
            global_cache: false,
            chaining: false,
            saturation: false,
            detect_deadlocks: false,
            max_iterations: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ReachabilityError {
    #[error("reachability search did not converge within {0} iterations")]
    MaxIterationsExceeded(usize),
}

/// Performs reachability analysis while learning each summand group's transition relation
/// on demand, rather than requiring it supplied whole up front.
///
/// `solve` is the injected rewrite-and-enumerate step: given a group index and a concrete
/// read-vector for that group, it returns the write-vector of every enabled solution (the
/// external collaborator that rewrites the summand's condition and next-state expressions
/// under the corresponding substitution and enumerates its quantified variables). `copies`
/// gives each group's static copy-mask (see `summand_group::TransitionGroup::copy`), in the
/// same order as `groups`.
///
/// Returns [`ReachabilityError::MaxIterationsExceeded`] if `options.max_iterations` is set and
/// the search has not reached a fixpoint within that many iterations.
pub fn reachability_with_learning<F>(
    storage: &mut Storage,
    initial_state: &Ldd,
    groups: &mut [SummandGroup],
    copies: &[Vec<bool>],
    options: &SymbolicReachabilityOptions,
    mut solve: F,
) -> Result<Reachable, SymckError>
where
    F: FnMut(usize, &[Value]) -> Vec<Vec<Value>>,
{
    let mut todo = initial_state.clone();
    let mut states = initial_state.clone();
    let mut deadlocks = storage.empty_set().clone();
    let mut global_learned = storage.empty_set().clone();
    let mut iteration = 0usize;

    let progress = TimeProgress::new(
        |iteration: usize| {
            info!("Iteration {}", iteration);
        },
        1,
    );

    while todo != *storage.empty_set() {
        if let Some(max) = options.max_iterations {
            if iteration >= max {
                return Err(ReachabilityError::MaxIterationsExceeded(max).into());
            }
        }

        let todo_before = todo.clone();
        let mut next = storage.empty_set().clone();
        let mut source = todo.clone();

        for (index, group) in groups.iter_mut().enumerate() {
            loop {
                let proj = project(storage, &source, group.read_proj());
                let new_reads = if options.cached {
                    let cache = if options.global_cache { &global_learned } else { group.domain() };
                    minus(storage, &proj, cache)
                } else {
                    proj
                };

                if new_reads != *storage.empty_set() {
                    group.learn(storage, &new_reads, |read| solve(index, read), &copies[index]);
                    if options.global_cache {
                        global_learned = union(storage, &global_learned, &new_reads);
                    }
                }

                let result = relational_product(storage, &source, group.relation(), group.meta());
                let fresh = minus(storage, &result, &next);
                next = union(storage, &next, &result);

                if options.chaining {
                    source = union(storage, &source, &fresh);
                }

                if !options.saturation || fresh == *storage.empty_set() {
                    break;
                }
            }
        }

        if options.detect_deadlocks {
            let stuck = minus(storage, &todo_before, &enabled(storage, &todo_before, &*groups));
            deadlocks = union(storage, &deadlocks, &stuck);
        }

        todo = minus(storage, &next, &states);
        states = union(storage, &states, &todo);
        progress.print(iteration);
        iteration += 1;
    }

    Ok(Reachable {
        states,
        state_count: len(storage, &states),
        deadlocks: options.detect_deadlocks.then_some(deadlocks),
    })
}

/// Computes the subset of `set` that has at least one enabled transition in some
/// summand group.
///
/// For each group, a state is enabled iff its read-projection lies in the group's
/// relation domain. `relational_product` with a read-only meta both performs that
/// membership test and lifts the narrow domain back to full-width states, since its
/// read-branch preserves the original state's own value rather than substituting in
/// a value from the relation (that substitution only happens on write branches).
fn enabled(storage: &mut Storage, set: &Ldd, groups: &[SummandGroup]) -> Ldd {
    let mut result = storage.empty_set().clone();
    for group in groups {
        let hit = relational_product(storage, set, group.domain(), group.read_only_meta());
        result = union(storage, &result, &hit);
    }
    result
}

#[cfg(test)]
mod tests {
    use symck_ldd::element_of;
    use symck_ldd::from_iter;
    use symck_ldd::len;

    use super::*;

    /// A single process parameter counting up from 0, with one group that writes `x + 1` as
    /// long as `x < 3`, learned on demand instead of supplied up front.
    fn counting_group(storage: &mut Storage) -> SummandGroup {
        SummandGroup::empty(storage, vec![], vec![0], vec![], vec![0])
    }

    fn counting_solve(_index: usize, read: &[Value]) -> Vec<Vec<Value>> {
        if read[0] < 3 { vec![vec![read[0] + 1]] } else { vec![] }
    }

    #[test]
    fn test_reachability_with_learning_finds_fixpoint() {
        let mut storage = Storage::new();
        let initial = from_iter(&mut storage, [vec![0]].iter());
        let mut groups = vec![counting_group(&mut storage)];
        let copies = vec![vec![false]];

        let result = reachability_with_learning(&mut storage, &initial, &mut groups, &copies, &SymbolicReachabilityOptions::default(), counting_solve).unwrap();

        assert_eq!(result.state_count(), 4);
        for value in 0..4 {
            assert!(element_of(&storage, &[value], result.states()));
        }
    }

    #[test]
    fn test_reachability_with_learning_respects_max_iterations() {
        let mut storage = Storage::new();
        let initial = from_iter(&mut storage, [vec![0]].iter());
        let mut groups = vec![counting_group(&mut storage)];
        let copies = vec![vec![false]];

        let options = SymbolicReachabilityOptions { max_iterations: Some(1), ..SymbolicReachabilityOptions::default() };
        let result = reachability_with_learning(&mut storage, &initial, &mut groups, &copies, &options, counting_solve);

        assert!(result.is_err());
    }

    #[test]
    fn test_reachability_with_learning_ignores_learned_cache_growth_when_uncached() {
        let mut storage = Storage::new();
        let initial = from_iter(&mut storage, [vec![0]].iter());
        let mut groups = vec![counting_group(&mut storage)];
        let copies = vec![vec![false]];

        let options = SymbolicReachabilityOptions { cached: false, ..SymbolicReachabilityOptions::default() };
        let result = reachability_with_learning(&mut storage, &initial, &mut groups, &copies, &options, counting_solve).unwrap();

        assert_eq!(result.state_count(), 4);
        assert_eq!(len(&mut storage, &groups[0].relation().clone()), 3);
    }
}
