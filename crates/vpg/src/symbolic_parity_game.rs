//! A parity game representation over a symbolically-computed reachable state set, where every
//! state's first coordinate is the ldd value of the PBES propositional-variable tag.

use std::collections::HashMap;

use symck_ldd::Ldd;
use symck_ldd::Storage;
use symck_ldd::Value;
use symck_ldd::intersect;
use symck_ldd::iter;
use symck_ldd::minus;
use symck_ldd::relational_product;
use symck_ldd::singleton;
use symck_ldd::union;
use symck_ldd::union_cube;
use symck_symbolic::Reachable;
use symck_symbolic::SummandGroup;

use crate::PbesEquationIndex;
use crate::Player;

/// A symbolic parity game built from a reachable state set, its transition groups, and the
/// mapping from the ldd value of the propositional-variable tag (state position 0) to the
/// PBES equation it originates from.
pub struct SymbolicParityGame<'a> {
    reachable: &'a Reachable,
    groups: &'a [SummandGroup],
    equation_index: &'a PbesEquationIndex,
    tag_name: HashMap<Value, String>,
}

impl<'a> SymbolicParityGame<'a> {
    pub fn new(
        reachable: &'a Reachable,
        groups: &'a [SummandGroup],
        equation_index: &'a PbesEquationIndex,
        tag_name: HashMap<Value, String>,
    ) -> Self {
        Self { reachable, groups, equation_index, tag_name }
    }

    fn name_of(&self, vertex: &[Value]) -> &str {
        &self.tag_name[&vertex[0]]
    }

    /// Partitions the reachable states by the rank of their defining equation.
    pub fn ranks(&self, storage: &mut Storage) -> HashMap<usize, Ldd> {
        let mut result: HashMap<usize, Ldd> = HashMap::new();
        for vertex in iter(storage, self.reachable.states()).collect::<Vec<_>>() {
            let rank = self.equation_index.rank(self.name_of(&vertex));
            let entry = result.entry(rank).or_insert_with(|| storage.empty_set().clone());
            *entry = union_single(storage, entry, &vertex);
        }
        result
    }

    /// Partitions the reachable states by owner: conjunctive equations belong to the odd
    /// (universal) player, disjunctive equations to the even (existential) player.
    pub fn players(&self, storage: &mut Storage) -> (Ldd, Ldd) {
        let mut even = storage.empty_set().clone();
        let mut odd = storage.empty_set().clone();

        for vertex in iter(storage, self.reachable.states()).collect::<Vec<_>>() {
            if self.equation_index.is_conjunctive(self.name_of(&vertex)) {
                odd = union_single(storage, &odd, &vertex);
            } else {
                even = union_single(storage, &even, &vertex);
            }
        }

        (even, odd)
    }

    /// Returns the set of successors of a single vertex, across all transition groups.
    pub fn successors(&self, storage: &mut Storage, vertex: &[Value]) -> Ldd {
        let source = singleton(storage, vertex);
        let mut result = storage.empty_set().clone();
        for group in self.groups {
            let next = relational_product(storage, &source, group.relation(), group.meta());
            result = union(storage, &result, &next);
        }
        result
    }

    /// Returns `{ u in U : exists v in W. u -> v }`.
    ///
    /// The kernel exposes only forward `relational_product`, so this is computed by enumerating
    /// `U` (the kernel's LDD-enumeration primitive) and testing, per candidate vertex, whether
    /// its forward image intersects `W` -- rather than adding a dedicated backward/preimage
    /// primitive to the kernel.
    pub fn predecessors(&self, storage: &mut Storage, u: &Ldd, w: &Ldd) -> Ldd {
        let mut result = storage.empty_set().clone();
        for vertex in iter(storage, u).collect::<Vec<_>>() {
            let reached = self.successors(storage, &vertex);
            let hit = intersect(storage, &reached, w);
            if hit != *storage.empty_set() {
                result = union_single(storage, &result, &vertex);
            }
        }
        result
    }

    /// Returns `U \ predecessors(U, V)`: the vertices of `U` with no outgoing edge into `V`.
    pub fn sinks(&self, storage: &mut Storage, u: &Ldd, v: &Ldd) -> Ldd {
        let pred = self.predecessors(storage, u, v);
        minus(storage, u, &pred)
    }

    /// Returns the vertices of `v_set \ i` that are safely controlled into `target`:
    /// `alpha`-vertices with at least one successor into `target`, and `(1 - alpha)`-vertices
    /// all of whose successors lie in `target`. When `chaining` is set, intermediate successors
    /// are additionally required to lie in `w_chain`.
    pub fn safe_control_predecessors(
        &self,
        storage: &mut Storage,
        alpha: Player,
        target: &Ldd,
        v_set: &Ldd,
        w_chain: Option<&Ldd>,
        vplayer: &(Ldd, Ldd),
        i: &Ldd,
    ) -> Ldd {
        let candidates = minus(storage, v_set, i);
        let mut result = storage.empty_set().clone();

        let owner_of = |storage: &mut Storage, vertex: &[Value]| -> Player {
            let singleton_v = singleton(storage, vertex);
            if intersect(storage, &singleton_v, &vplayer.1) != *storage.empty_set() {
                Player::Odd
            } else {
                Player::Even
            }
        };

        for vertex in iter(storage, &candidates).collect::<Vec<_>>() {
            let owner = owner_of(storage, &vertex);
            let mut reached = self.successors(storage, &vertex);
            if let Some(w_chain) = w_chain {
                reached = intersect(storage, &reached, w_chain);
            }

            let added = if owner == alpha {
                intersect(storage, &reached, target) != *storage.empty_set()
            } else {
                let outside = minus(storage, &reached, target);
                outside == *storage.empty_set() && reached != *storage.empty_set()
            };

            if added {
                result = union_single(storage, &result, &vertex);
            }
        }

        result
    }

    /// Restricts the game's edges according to a positional strategy for `alpha`: for every
    /// `alpha`-owned vertex in `strategy`, only the chosen successor survives; all other edges
    /// (including every edge of non-`alpha` vertices) are kept as-is. Returns the surviving
    /// `(vertex, successor)` pairs as a relation over the doubled-width vector space.
    pub fn apply_strategy(&self, storage: &mut Storage, strategy: &HashMap<Vec<Value>, Vec<Value>>) -> Ldd {
        let mut result = storage.empty_set().clone();
        for (vertex, target) in strategy {
            let mut pair = vertex.clone();
            pair.extend(target.iter().copied());
            result = union_cube(storage, &result, &pair);
        }
        result
    }
}

fn union_single(storage: &mut Storage, set: &Ldd, vertex: &[Value]) -> Ldd {
    let singleton_v = singleton(storage, vertex);
    union(storage, set, &singleton_v)
}

#[cfg(test)]
mod tests {
    use symck_ldd::from_iter;

    use super::*;
    use crate::FixpointSymbol;

    #[test]
    fn test_ranks_and_players_partition_by_tag() {
        let mut storage = Storage::new();
        let states = from_iter(&mut storage, [vec![0, 1], vec![1, 2]].iter());
        let reachable = Reachable::new(states.clone(), 2, None);

        let equations = vec![
            ("X".to_string(), FixpointSymbol::Nu, false),
            ("Y".to_string(), FixpointSymbol::Mu, true),
        ];
        let equation_index = PbesEquationIndex::new(&equations);

        let mut tag_name = HashMap::new();
        tag_name.insert(0, "X".to_string());
        tag_name.insert(1, "Y".to_string());

        let groups: Vec<SummandGroup> = Vec::new();
        let game = SymbolicParityGame::new(&reachable, &groups, &equation_index, tag_name);

        let ranks = game.ranks(&mut storage);
        assert_eq!(ranks.len(), 2);

        let (even, odd) = game.players(&mut storage);
        assert!(symck_ldd::element_of(&storage, &[0, 1], &even));
        assert!(symck_ldd::element_of(&storage, &[1, 2], &odd));
    }
}
