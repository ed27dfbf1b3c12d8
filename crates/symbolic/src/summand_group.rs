use std::fmt;

use rand::seq::SliceRandom;
use symck_aterm::Term;
use symck_data::DataExpression;
use symck_data::DataExpressionRef;
use symck_data::DataVariable;
use symck_data::is_data_variable;

/// A rewritten summand `(e, f, g, a)`: existentially-bound summation variables, a boolean
/// condition, one next-state expression per process parameter, and the free arguments of its
/// action (or, for a PBES-derived specification, of its propositional-variable update).
#[derive(Clone, Debug)]
pub struct Summand {
    pub summation_variables: Vec<DataVariable>,
    pub condition: DataExpression,
    pub next_state: Vec<DataExpression>,
    pub action_arguments: Vec<DataExpression>,
}

impl Summand {
    pub fn new(summation_variables: Vec<DataVariable>, condition: DataExpression, next_state: Vec<DataExpression>, action_arguments: Vec<DataExpression>) -> Self {
        Summand {
            summation_variables,
            condition,
            next_state,
            action_arguments,
        }
    }
}

fn variable_key(variable: &DataVariable) -> String {
    format!("{}: {}", variable.name(), variable.sort())
}

fn is_identity_update(expr: &DataExpression, parameter: &DataVariable) -> bool {
    is_data_variable(expr) && variable_key(&DataVariable::from(expr.clone())) == variable_key(parameter)
}

fn collect_free_variables(expr: &DataExpressionRef, out: &mut Vec<String>) {
    if is_data_variable(expr) {
        let owned: DataExpression = expr.protect().into();
        let key = variable_key(&DataVariable::from(owned));
        if !out.contains(&key) {
            out.push(key);
        }
    } else {
        for arg in expr.data_arguments() {
            collect_free_variables(&arg, out);
        }
    }
}

/// Returns the keys (name/sort pairs, see [`variable_key`]) of every variable occurring free in
/// `expr`, deduplicated.
fn free_variable_keys(expr: &DataExpression) -> Vec<String> {
    let mut out = Vec::new();
    if is_data_variable(expr) {
        out.push(variable_key(&DataVariable::from(expr.clone())));
    } else {
        for arg in expr.data_arguments() {
            collect_free_variables(&arg, &mut out);
        }
    }
    out
}

/// The read/write bit-vector of a single summand, one bit per process parameter (§3).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadWritePattern {
    pub read: Vec<bool>,
    pub write: Vec<bool>,
}

/// Computes the read/write pattern of `summand` over `parameters`.
///
/// Parameter `i` is written iff `next_state[i]` is not literally `parameters[i]` itself.
/// Parameter `i` is read iff it occurs free in the condition, in an action argument, or in some
/// `next_state[j]` that is itself a write (`j` such that `next_state[j] != parameters[j]`).
pub fn compute_pattern(parameters: &[DataVariable], summand: &Summand) -> ReadWritePattern {
    let n = parameters.len();
    let mut write = vec![false; n];
    for (j, g_j) in summand.next_state.iter().enumerate() {
        write[j] = !is_identity_update(g_j, &parameters[j]);
    }

    let keys: Vec<String> = parameters.iter().map(variable_key).collect();
    let mut read = vec![false; n];
    let mut mark_read = |expr: &DataExpression| {
        for key in free_variable_keys(expr) {
            if let Some(i) = keys.iter().position(|k| *k == key) {
                read[i] = true;
            }
        }
    };

    mark_read(&summand.condition);
    for arg in &summand.action_arguments {
        mark_read(arg);
    }
    for (j, g_j) in summand.next_state.iter().enumerate() {
        if write[j] {
            mark_read(g_j);
        }
    }

    ReadWritePattern { read, write }
}

/// Flags widening a summand's pattern before grouping (§4.2 step 3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WideningFlags {
    pub no_discard: bool,
    pub no_discard_read: bool,
    pub no_discard_write: bool,
}

/// Widens `pattern` to the full parameter set per the requested flags.
pub fn apply_widening(pattern: &mut ReadWritePattern, flags: WideningFlags) {
    if flags.no_discard || flags.no_discard_read {
        pattern.read.iter_mut().for_each(|b| *b = true);
    }
    if flags.no_discard || flags.no_discard_write {
        pattern.write.iter_mut().for_each(|b| *b = true);
    }
}

/// Checks that `permutation` is a bijection over `0..permutation.len()`, and, if `fix_first`,
/// that it fixes position 0 (the PBES propositional-variable tag, when present).
pub fn validate_permutation(permutation: &[usize], fix_first: bool) -> Result<(), String> {
    let n = permutation.len();
    let mut seen = vec![false; n];
    for &p in permutation {
        if p >= n || seen[p] {
            return Err(format!("variable order is not a bijection over 0..{n}"));
        }
        seen[p] = true;
    }
    if fix_first && permutation.first() != Some(&0) {
        return Err("variable order must fix position 0, the PBES propositional-variable tag".to_string());
    }
    Ok(())
}

/// Produces a uniformly-random permutation of `0..n`, fixing position 0 when `fix_first`.
pub fn random_permutation(n: usize, fix_first: bool) -> Vec<usize> {
    let mut permutation: Vec<usize> = (0..n).collect();
    if fix_first && n > 1 {
        permutation[1..].shuffle(&mut rand::rng());
    } else if !fix_first {
        permutation.shuffle(&mut rand::rng());
    }
    permutation
}

/// Reorders `items` according to `permutation`, so that position `k` of the result holds
/// `items[permutation[k]]`.
pub fn apply_permutation<T: Clone>(items: &[T], permutation: &[usize]) -> Vec<T> {
    permutation.iter().map(|&i| items[i].clone()).collect()
}

fn permute_pattern(pattern: &ReadWritePattern, permutation: &[usize]) -> ReadWritePattern {
    ReadWritePattern {
        read: permutation.iter().map(|&i| pattern.read[i]).collect(),
        write: permutation.iter().map(|&i| pattern.write[i]).collect(),
    }
}

/// The requested grouping of summands into transition groups (§4.2 step 5).
#[derive(Clone, Debug)]
pub enum GroupingPolicy {
    /// One group per summand.
    None,
    /// Group by equal `read ∪ write`.
    Used,
    /// Group by equal `(read, write)`.
    Simple,
    /// An explicit partition of summand indices, e.g. `"0;1 3 4;2 5"`.
    ExplicitList(Vec<Vec<usize>>),
}

/// Partitions `0..patterns.len()` according to `policy`, returning the summand indices of each
/// group in discovery order.
pub fn group_summands(patterns: &[ReadWritePattern], policy: &GroupingPolicy) -> Result<Vec<Vec<usize>>, String> {
    match policy {
        GroupingPolicy::None => Ok((0..patterns.len()).map(|i| vec![i]).collect()),
        GroupingPolicy::Simple => {
            let mut groups: Vec<Vec<usize>> = Vec::new();
            for (i, pattern) in patterns.iter().enumerate() {
                match groups.iter_mut().find(|g| patterns[g[0]] == *pattern) {
                    Some(g) => g.push(i),
                    None => groups.push(vec![i]),
                }
            }
            Ok(groups)
        }
        GroupingPolicy::Used => {
            let used = |p: &ReadWritePattern| -> Vec<bool> { p.read.iter().zip(p.write.iter()).map(|(&r, &w)| r || w).collect() };
            let mut groups: Vec<Vec<usize>> = Vec::new();
            for (i, pattern) in patterns.iter().enumerate() {
                let u = used(pattern);
                match groups.iter_mut().find(|g| used(&patterns[g[0]]) == u) {
                    Some(g) => g.push(i),
                    None => groups.push(vec![i]),
                }
            }
            Ok(groups)
        }
        GroupingPolicy::ExplicitList(partition) => {
            let n = patterns.len();
            let mut seen = vec![false; n];
            for group in partition {
                for &i in group {
                    if i >= n || seen[i] {
                        return Err("explicit summand grouping is not a partition: index out of range or listed twice".to_string());
                    }
                    seen[i] = true;
                }
            }
            if seen.iter().any(|&s| !s) {
                return Err("explicit summand grouping is not a partition: some summand is not covered".to_string());
            }
            Ok(partition.clone())
        }
    }
}

/// Interleaves `read` and `write` positions the way a transition tuple stores them: ascending by
/// parameter index, with a position that is both read and written contributing two consecutive
/// slots (read-phase, then write-phase), matching `compute_domain_proj`'s convention for the
/// relation an eventual [`SummandGroup`](crate::SummandGroup) projects onto.
fn interleaved_positions(read: &[usize], write: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let length = read.iter().chain(write.iter()).max().map_or(0, |m| m + 1);

    let mut read_pos = Vec::with_capacity(read.len());
    let mut write_pos = Vec::with_capacity(write.len());
    let mut slot = 0usize;
    for i in 0..length {
        if read.contains(&i) {
            read_pos.push(slot);
            slot += 1;
        }
        if write.contains(&i) {
            write_pos.push(slot);
            slot += 1;
        }
    }
    (read_pos, write_pos)
}

/// The static description of one transition group (§3 "Transition group", §4.2 step 6): which
/// parameters it reads and writes, where those values sit in the interleaved tuple
/// representation, and which write slots are mere copies of a read value.
#[derive(Clone, Debug)]
pub struct TransitionGroup {
    /// Indices into the summand list that belong to this group.
    pub summand_indices: Vec<usize>,
    /// Process-parameter indices read by this group, ascending.
    pub read: Vec<usize>,
    /// Process-parameter indices written by this group, ascending.
    pub write: Vec<usize>,
    /// `read_pos[k]` is the tuple slot holding the value read for `read[k]`.
    pub read_pos: Vec<usize>,
    /// `write_pos[k]` is the tuple slot holding the value written for `write[k]`.
    pub write_pos: Vec<usize>,
    /// One entry per tuple slot: true if that slot is always a copy of the read value (the
    /// group's summands never actually change it, despite the coarser grouping widening it into
    /// the write set).
    pub copy: Vec<bool>,
}

fn bits_to_positions(bits: &[bool]) -> Vec<usize> {
    bits.iter().enumerate().filter_map(|(i, &b)| b.then_some(i)).collect()
}

fn compute_copy(parameters: &[DataVariable], summands: &[Summand], group: &[usize], read: &[usize], write: &[usize], write_pos: &[usize]) -> Vec<bool> {
    let mut copy = vec![false; read.len() + write.len()];

    for (k, &param) in write.iter().enumerate() {
        if !read.contains(&param) {
            continue;
        }
        let always_identity = group.iter().all(|&s| is_identity_update(&summands[s].next_state[param], &parameters[param]));
        if always_identity {
            copy[write_pos[k]] = true;
        }
    }
    copy
}

/// Runs §4.2 steps 2-6: computes each summand's read/write pattern, widens it, permutes it, and
/// groups the summands into [`TransitionGroup`]s. Step 1 (preprocessing/SRF normalisation) and
/// the LDD-level `Ip`/`Ir` construction (handed to
/// [`SummandGroup::from_indices`](crate::SummandGroup::from_indices)) happen elsewhere.
///
/// Returns the (possibly reordered, per `permutation`) parameter list alongside the groups.
pub fn build_transition_groups(
    parameters: &[DataVariable],
    summands: &[Summand],
    widening: WideningFlags,
    permutation: Option<&[usize]>,
    policy: &GroupingPolicy,
) -> Result<(Vec<DataVariable>, Vec<TransitionGroup>), String> {
    let identity = (0..parameters.len()).collect::<Vec<_>>();
    let permutation = permutation.unwrap_or(&identity);
    validate_permutation(permutation, false)?;

    let ordered_parameters = apply_permutation(parameters, permutation);

    let mut patterns: Vec<ReadWritePattern> = summands
        .iter()
        .map(|s| {
            let mut pattern = compute_pattern(parameters, s);
            apply_widening(&mut pattern, widening);
            permute_pattern(&pattern, permutation)
        })
        .collect();

    // `simple`/`used` compare patterns structurally; widening has already normalised them.
    let groups = group_summands(&patterns, policy)?;
    patterns.shrink_to_fit();

    let transition_groups = groups
        .into_iter()
        .map(|summand_indices| {
            let mut read = vec![false; ordered_parameters.len()];
            let mut write = vec![false; ordered_parameters.len()];
            for &i in &summand_indices {
                for (pos, &b) in patterns[i].read.iter().enumerate() {
                    read[pos] |= b;
                }
                for (pos, &b) in patterns[i].write.iter().enumerate() {
                    write[pos] |= b;
                }
            }

            let read = bits_to_positions(&read);
            let write = bits_to_positions(&write);
            let (read_pos, write_pos) = interleaved_positions(&read, &write);
            let copy = compute_copy(&ordered_parameters, summands, &summand_indices, &read, &write, &write_pos);

            TransitionGroup {
                summand_indices,
                read,
                write,
                read_pos,
                write_pos,
                copy,
            }
        })
        .collect();

    Ok((ordered_parameters, transition_groups))
}

impl fmt::Display for TransitionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group({:?}): read={:?} write={:?} copy={:?}", self.summand_indices, self.read, self.write, self.copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symck_data::DataFunctionSymbol;

    fn var(name: &str) -> DataVariable {
        DataVariable::new(name)
    }

    #[test]
    fn test_identity_update_is_not_written() {
        let x = var("x");
        let y = var("y");
        let parameters = vec![x.clone(), y.clone()];

        // x' = x, y' = true: only y is written, and y is not read.
        let summand = Summand::new(vec![], DataFunctionSymbol::new("true").into(), vec![x.clone().into(), DataFunctionSymbol::new("true").into()], vec![]);

        let pattern = compute_pattern(&parameters, &summand);
        assert_eq!(pattern.write, vec![false, true]);
        assert_eq!(pattern.read, vec![false, false]);
    }

    #[test]
    fn test_write_of_own_value_marks_it_read() {
        let x = var("x");
        let parameters = vec![x.clone()];

        // x' = x (written, via the condition referencing x only) -- use a next_state that
        // re-reads x through a trivial application-free reference by writing a different
        // variable's value copied from x is out of scope here, so instead check that a summand
        // reading x in the condition marks x read even though it writes nothing.
        let summand = Summand::new(vec![], x.clone().into(), vec![x.clone().into()], vec![]);

        let pattern = compute_pattern(&parameters, &summand);
        assert_eq!(pattern.write, vec![false]);
        assert_eq!(pattern.read, vec![true]);
    }

    #[test]
    fn test_widening_marks_every_position() {
        let mut pattern = ReadWritePattern {
            read: vec![false, true],
            write: vec![false, false],
        };
        apply_widening(
            &mut pattern,
            WideningFlags {
                no_discard: true,
                ..Default::default()
            },
        );
        assert_eq!(pattern.read, vec![true, true]);
        assert_eq!(pattern.write, vec![true, true]);
    }

    #[test]
    fn test_validate_permutation_rejects_non_bijection() {
        assert!(validate_permutation(&[0, 0], false).is_err());
        assert!(validate_permutation(&[0, 2], false).is_err());
        assert!(validate_permutation(&[1, 0], false).is_ok());
    }

    #[test]
    fn test_validate_permutation_fix_first() {
        assert!(validate_permutation(&[1, 0], true).is_err());
        assert!(validate_permutation(&[0, 1], true).is_ok());
    }

    #[test]
    fn test_interleaved_positions_double_up_read_write_parameters() {
        // parameter 0 read-only, parameter 1 read & written, parameter 2 write-only.
        let (read_pos, write_pos) = interleaved_positions(&[0, 1], &[1, 2]);
        assert_eq!(read_pos, vec![0, 1]);
        assert_eq!(write_pos, vec![2, 3]);
    }

    #[test]
    fn test_explicit_grouping_rejects_incomplete_partition() {
        let patterns = vec![
            ReadWritePattern { read: vec![], write: vec![] },
            ReadWritePattern { read: vec![], write: vec![] },
        ];
        let policy = GroupingPolicy::ExplicitList(vec![vec![0]]);
        assert!(group_summands(&patterns, &policy).is_err());
    }

    #[test]
    fn test_simple_grouping_merges_equal_patterns() {
        let patterns = vec![
            ReadWritePattern { read: vec![true], write: vec![false] },
            ReadWritePattern { read: vec![true], write: vec![false] },
            ReadWritePattern { read: vec![false], write: vec![true] },
        ];
        let groups = group_summands(&patterns, &GroupingPolicy::Simple).unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_build_transition_groups_none_policy_one_group_per_summand() {
        let x = var("x");
        let parameters = vec![x.clone()];
        let summands = vec![
            Summand::new(vec![], DataFunctionSymbol::new("true").into(), vec![DataFunctionSymbol::new("true").into()], vec![]),
            Summand::new(vec![], DataFunctionSymbol::new("false").into(), vec![x.clone().into()], vec![]),
        ];

        let (ordered, groups) = build_transition_groups(&parameters, &summands, WideningFlags::default(), None, &GroupingPolicy::None).unwrap();

        assert_eq!(ordered.len(), 1);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].write, vec![0]);
        assert_eq!(groups[1].write, Vec::<usize>::new());
    }
}
