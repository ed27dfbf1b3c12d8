use std::fmt;

use symck_aterm::ATerm;
use symck_data::DataSpecification;
use symck_ldd::Ldd;
use symck_ldd::Storage;
use symck_ldd::Value;
use symck_ldd::compute_meta;
use symck_ldd::compute_proj;
use symck_ldd::iter;
use symck_ldd::project;
use symck_ldd::union;
use symck_ldd::union_cube_copy;

/// Represents a symbolic LTS encoded by a disjunctive transition relation and a set of states.
pub struct SymbolicLts {
    data_specification: DataSpecification,

    states: Ldd,

    /// A singleton LDD representing the initial state.
    initial_state: Ldd,

    summand_groups: Vec<SummandGroup>,
}

impl SymbolicLts {
    /// Creates a new symbolic LTS.
    pub fn new(
        data_specification: DataSpecification,
        states: Ldd,
        initial_state: Ldd,
        summand_groups: Vec<SummandGroup>,
    ) -> Self {
        Self {
            data_specification,
            states,
            initial_state,
            summand_groups,
        }
    }

    /// Returns the data specification of the LTS.
    pub fn data_specification(&self) -> &DataSpecification {
        &self.data_specification
    }

    /// Returns the LDD representing the set of states.
    pub fn states(&self) -> &Ldd {
        &self.states
    }

    /// Returns the LDD representing the initial state.
    pub fn initial_state(&self) -> &Ldd {
        &self.initial_state
    }

    /// Returns an iterator over the summand groups.
    pub fn summand_groups(&self) -> &[SummandGroup] {
        &self.summand_groups
    }
}

/// Represents a short vector transition relation for a group of summands.
///
/// # Details
///
/// A short transition vector is part of a transition relation T -> U, where we
/// store T' -> U' with T' being the projection of T on the read parameters and
/// U' the projection of U on the write parameters, as a LDD. Formally,
///
/// (t, u) in (T -> U)  iff  (t', u') in (T' -> U') where t' and u' are the projections
///     of t and u on the read and write parameters respectively.
pub struct SummandGroup {
    read_parameters: Vec<ATerm>,
    read_parameter_indices: Vec<Value>,

    write_parameters: Vec<ATerm>,
    write_parameter_indices: Vec<Value>,

    /// The transition relation T' -> U' for this summand group.
    relation: Ldd,

    /// Marks, per position in the full process parameter vector, whether this
    /// group reads and/or writes it. Used as the `meta` argument to
    /// `relational_product` so the kernel knows which positions to match
    /// against and which to replace.
    meta: Ldd,

    /// A read-only meta, i.e. `compute_meta(read_parameter_indices, [])`. Lets
    /// `relational_product` lift a read-projected set back to full vectors
    /// while preserving the original (not a relation's) value at every
    /// position, which is how deadlock detection recovers full states
    /// from `domain` below without a dedicated predecessor primitive.
    read_only_meta: Ldd,

    /// `Ldomain(G)`: the read-projected source tuples this group has already explored. For a
    /// group read whole from a file this is derived once from `relation` at construction time
    /// (`project(relation, domain_proj)`, see [`compute_domain_proj`]); for a group built with
    /// [`SummandGroup::empty`] it starts empty and grows via [`learn`](Self::learn), exactly
    /// tracking the spec's `Ldomain(G)`.
    domain: Ldd,

    /// The `Ip` projection mask: applied to a full-width state set with `project` to obtain this
    /// group's read-projection, in the same value space as `domain`.
    read_proj: Ldd,
}

impl SummandGroup {
    /// Creates a new summand group.
    ///
    /// This can fail if one of the read or write parameters is not in the list of all
    /// process parameters.
    pub fn new(
        storage: &mut Storage,
        parameters: &[ATerm],
        read_parameters: Vec<ATerm>,
        write_parameters: Vec<ATerm>,
        relation: Ldd,
    ) -> Result<Self, String> {
        let read_parameter_indices = parameter_indices(parameters, &read_parameters, "read")?;
        let write_parameter_indices = parameter_indices(parameters, &write_parameters, "write")?;

        Ok(Self::from_indices(
            storage,
            read_parameters,
            read_parameter_indices,
            write_parameters,
            write_parameter_indices,
            relation,
        ))
    }

    /// Creates a summand group directly from read/write parameter indices, for formats
    /// (such as Sylvan's binary `.ldd` format) that carry no parameter names at all.
    pub fn from_indices(
        storage: &mut Storage,
        read_parameters: Vec<ATerm>,
        read_parameter_indices: Vec<Value>,
        write_parameters: Vec<ATerm>,
        write_parameter_indices: Vec<Value>,
        relation: Ldd,
    ) -> Self {
        let meta = compute_meta(storage, &read_parameter_indices, &write_parameter_indices);
        let read_only_meta = compute_meta(storage, &read_parameter_indices, &[]);
        let domain_proj = compute_domain_proj(storage, &read_parameter_indices, &write_parameter_indices);
        let domain = project(storage, &relation, &domain_proj);
        let read_proj = compute_proj(storage, &read_parameter_indices);

        Self {
            read_parameters,
            read_parameter_indices,
            write_parameters,
            write_parameter_indices,
            relation,
            meta,
            read_only_meta,
            domain,
            read_proj,
        }
    }

    /// Creates a summand group with an empty transition relation, ready to learn transitions
    /// on demand (§4.3 steps 2-4) rather than having them supplied whole from a file.
    pub fn empty(storage: &mut Storage, read_parameters: Vec<ATerm>, read_parameter_indices: Vec<Value>, write_parameters: Vec<ATerm>, write_parameter_indices: Vec<Value>) -> Self {
        let empty_relation = storage.empty_set().clone();
        Self::from_indices(storage, read_parameters, read_parameter_indices, write_parameters, write_parameter_indices, empty_relation)
    }

    /// Learns transitions for every concrete read-vector in `new_reads` (a subset of this
    /// group's read-projection not already in `Ldomain(G)`), appending the resulting tuples to
    /// `relation` via `union_cube_copy` and adding `new_reads` to `Ldomain(G)` (§4.3 steps 3-4).
    ///
    /// `solve` is the injected rewrite-and-enumerate step: given a concrete read-vector it
    /// returns the write-vector of every summand solution enabled from it (zero if the
    /// (rewritten) condition is false for all of them). `copy` is this group's static copy-mask
    /// (see `summand_group::TransitionGroup::copy`), `|read|+|write|` long.
    pub fn learn(&mut self, storage: &mut Storage, new_reads: &Ldd, mut solve: impl FnMut(&[Value]) -> Vec<Vec<Value>>, copy: &[bool]) {
        let read_vectors: Vec<Vec<Value>> = iter(storage, new_reads).collect();
        for read_vector in read_vectors {
            for write_vector in solve(&read_vector) {
                let tuple = interleave(&self.read_parameter_indices, &self.write_parameter_indices, &read_vector, &write_vector);
                self.relation = union_cube_copy(storage, &self.relation, &tuple, copy);
            }
        }
        self.domain = union(storage, &self.domain, new_reads);
    }

    /// Returns the transition relation LDD for this summand group.
    pub fn relation(&self) -> &Ldd {
        &self.relation
    }

    /// Returns the meta information for this summand group.
    pub fn meta(&self) -> &Ldd {
        &self.meta
    }

    /// Returns the read-only meta used to lift `domain` back to full state vectors.
    pub fn read_only_meta(&self) -> &Ldd {
        &self.read_only_meta
    }

    /// Returns `Ldomain(G)`, the read-projected domain of this group's relation.
    pub fn domain(&self) -> &Ldd {
        &self.domain
    }

    /// Returns `Ip`, the projection mask that reads this group's parameters off a full-width
    /// state set.
    pub fn read_proj(&self) -> &Ldd {
        &self.read_proj
    }

    /// Returns the read parameters for this summand group.
    pub fn read_parameters(&self) -> &[ATerm] {
        &self.read_parameters
    }

    /// Returns the write parameters for this summand group.
    pub fn write_parameters(&self) -> &[ATerm] {
        &self.write_parameters
    }
}

/// Builds the projection used to recover `relation`'s read-phase domain.
///
/// `relation` interleaves one level per non-zero entry of `compute_meta(read, write)`:
/// a single level for a read-only or write-only position, and two consecutive levels
/// (read-phase, then write-phase) for a position that is both read and written. This
/// mirrors that same interleaving, keeping the read-phase levels and dropping every
/// write-phase one, so that `project(relation, domain_proj)` yields exactly T'.
fn compute_domain_proj(storage: &mut Storage, read_proj: &[Value], write_proj: &[Value]) -> Ldd {
    use std::cmp;

    let length = cmp::max(
        read_proj.iter().max().map_or(0, |x| *x + 1),
        write_proj.iter().max().map_or(0, |x| *x + 1),
    );

    let mut proj: Vec<Value> = Vec::new();
    for i in 0..length {
        let read = read_proj.contains(&i);
        let write = write_proj.contains(&i);

        if read && write {
            proj.push(1); // read phase: keep
            proj.push(0); // write phase: drop
        } else if read {
            proj.push(1);
        } else if write {
            proj.push(0);
        }
    }

    symck_ldd::singleton(storage, &proj)
}

/// Interleaves a concrete read-vector and write-vector the way `relation` stores a transition
/// tuple: the same per-position (read-phase, write-phase) ordering as [`compute_domain_proj`].
fn interleave(read_indices: &[Value], write_indices: &[Value], read_vector: &[Value], write_vector: &[Value]) -> Vec<Value> {
    let length = read_indices.iter().chain(write_indices.iter()).max().map_or(0, |m| *m + 1);

    let mut tuple = Vec::with_capacity(read_vector.len() + write_vector.len());
    for i in 0..length {
        if let Some(pos) = read_indices.iter().position(|&r| r == i) {
            tuple.push(read_vector[pos]);
        }
        if let Some(pos) = write_indices.iter().position(|&w| w == i) {
            tuple.push(write_vector[pos]);
        }
    }
    tuple
}

/// Finds the position of each of `subset` in `parameters`, in order.
fn parameter_indices(parameters: &[ATerm], subset: &[ATerm], kind: &str) -> Result<Vec<Value>, String> {
    subset
        .iter()
        .map(|var| {
            parameters
                .iter()
                .position(|p| p == var)
                .ok_or_else(|| format!("Cannot find {kind} parameter {var:?}"))
                .map(|pos| pos as Value)
        })
        .collect()
}

impl fmt::Debug for SummandGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummandGroup")
            .field("read_parameters", &self.read_parameters)
            .field("read_parameter_indices", &self.read_parameter_indices)
            .field("write_parameters", &self.write_parameters)
            .field("write_parameter_indices", &self.write_parameter_indices)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use symck_ldd::element_of;
    use symck_ldd::len;

    use super::*;

    #[test]
    fn test_empty_group_has_no_transitions_or_domain() {
        let mut storage = Storage::new();
        let group = SummandGroup::empty(&mut storage, vec![], vec![0], vec![], vec![1]);

        assert_eq!(*group.relation(), *storage.empty_set());
        assert_eq!(*group.domain(), *storage.empty_set());
    }

    #[test]
    fn test_learn_appends_tuples_and_grows_domain() {
        let mut storage = Storage::new();
        // Parameter 0 is read, parameter 1 is written: a one-position read, one-position write.
        let mut group = SummandGroup::empty(&mut storage, vec![], vec![0], vec![], vec![1]);

        let new_reads = symck_ldd::from_iter(&mut storage, [vec![3]].iter());
        group.learn(&mut storage, &new_reads, |read| vec![vec![read[0] + 1]], &[false, false]);

        assert!(element_of(&storage, &[3], group.domain()));
        assert_eq!(len(&mut storage, &group.relation().clone()), 1);
        assert!(element_of(&storage, &[3, 4], group.relation()));
    }

    #[test]
    fn test_learn_is_idempotent_on_already_learned_reads() {
        let mut storage = Storage::new();
        let mut group = SummandGroup::empty(&mut storage, vec![], vec![0], vec![], vec![1]);

        let new_reads = symck_ldd::from_iter(&mut storage, [vec![3]].iter());
        group.learn(&mut storage, &new_reads, |read| vec![vec![read[0] + 1]], &[false, false]);
        group.learn(&mut storage, &new_reads, |read| vec![vec![read[0] + 1]], &[false, false]);

        assert_eq!(len(&mut storage, &group.relation().clone()), 1);
    }

    #[test]
    fn test_interleave_orders_read_and_write_phases_by_parameter_position() {
        // parameter 0 read-only, parameter 1 read & written, parameter 2 write-only.
        let tuple = interleave(&[0, 1], &[1, 2], &[10, 20], &[21, 30]);
        assert_eq!(tuple, vec![10, 20, 21, 30]);
    }
}
