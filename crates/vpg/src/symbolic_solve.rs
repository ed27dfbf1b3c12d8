//! Symbolic Zielonka recursion over a [`SymbolicParityGame`], using safe attractors so that
//! incomplete (not-yet-fully-explored) vertices are never falsely forced into a region.

use std::collections::HashMap;

use symck_ldd::Ldd;
use symck_ldd::Storage;
use symck_ldd::Value;
use symck_ldd::intersect;
use symck_ldd::iter;
use symck_ldd::minus;
use symck_ldd::union;
use thiserror::Error;

use crate::Player;
use crate::SymbolicParityGame;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("zielonka recursion reached an empty vertex set with a non-empty rank map")]
    EmptyRankMap,
}

/// A positional strategy: the chosen successor for every vertex it is defined on.
pub type Strategy = HashMap<Vec<Value>, Vec<Value>>;

/// The result of solving a (sub)game: the winning regions for both players, and the witness
/// strategies restricted to the vertices of the corresponding region.
pub struct Solution {
    pub winning: [Ldd; 2],
    pub strategy: [Strategy; 2],
}

/// Computes the safe attractor `Attr_alpha(U, V, I)`: the least fixpoint of `U` under
/// `safe_control_predecessors`, together with a witness strategy recording, for every
/// `alpha`-vertex added, one successor that justified its addition.
pub fn attractor(
    storage: &mut Storage,
    game: &SymbolicParityGame,
    alpha: Player,
    u: &Ldd,
    v_set: &Ldd,
    vplayer: &(Ldd, Ldd),
    i: &Ldd,
) -> (Ldd, Strategy) {
    let alpha_set = if alpha == Player::Even { vplayer.0.clone() } else { vplayer.1.clone() };

    let mut current = u.clone();
    let mut strategy = Strategy::new();

    loop {
        let added = game.safe_control_predecessors(storage, alpha, &current, v_set, None, vplayer, i);

        for vertex in iter(storage, &added) {
            if strategy.contains_key(&vertex) {
                continue;
            }
            let singleton_v = symck_ldd::singleton(storage, &vertex);
            let owned_by_alpha = intersect(storage, &singleton_v, &alpha_set) != *storage.empty_set();
            if owned_by_alpha {
                if let Some(witness) = find_witness(storage, game, &vertex, &current) {
                    strategy.insert(vertex, witness);
                }
            }
        }

        let next = union(storage, &current, &added);
        if next == current {
            break;
        }
        current = next;
    }

    (current, strategy)
}

/// Finds a successor of `vertex` that lies in `target`, used to build the witness strategy.
fn find_witness(storage: &mut Storage, game: &SymbolicParityGame, vertex: &[Value], target: &Ldd) -> Option<Vec<Value>> {
    let successors = game.successors(storage, vertex);
    let hit = intersect(storage, &successors, target);
    iter(storage, &hit).next()
}

/// Recursively solves the parity (sub)game over vertex set `v_set`.
pub fn zielonka(storage: &mut Storage, game: &SymbolicParityGame, v_set: &Ldd) -> Result<Solution, SolverError> {
    if *v_set == *storage.empty_set() {
        return Ok(Solution {
            winning: [storage.empty_set().clone(), storage.empty_set().clone()],
            strategy: [Strategy::new(), Strategy::new()],
        });
    }

    let ranks = game.ranks(storage);
    let mut sorted_ranks: Vec<usize> = ranks.keys().copied().collect();
    sorted_ranks.sort_unstable();

    let (min_rank, u) = sorted_ranks
        .into_iter()
        .find_map(|rank| {
            let candidate = intersect(storage, v_set, &ranks[&rank]);
            (candidate != *storage.empty_set()).then_some((rank, candidate))
        })
        .ok_or(SolverError::EmptyRankMap)?;

    let alpha = if min_rank % 2 == 0 { Player::Even } else { Player::Odd };
    let (v_even, v_odd) = game.players(storage);
    let vplayer = (intersect(storage, v_set, &v_even), intersect(storage, v_set, &v_odd));

    let empty = storage.empty_set().clone();
    let (a, a_strategy) = attractor(storage, game, alpha, &u, v_set, &vplayer, &empty);

    let rest = minus(storage, v_set, &a);
    let mut inner = zielonka(storage, game, &rest)?;

    let opponent = alpha.opponent();
    let mut win;
    let mut win_strategy;

    if inner.winning[opponent.to_index()] == *storage.empty_set() {
        win = [empty.clone(), empty.clone()];
        win[alpha.to_index()] = union(storage, &a, &inner.winning[alpha.to_index()]);
        win_strategy = [Strategy::new(), Strategy::new()];
        win_strategy[alpha.to_index()] = merge_strategy(a_strategy, std::mem::take(&mut inner.strategy[alpha.to_index()]));
    } else {
        let (b, b_strategy) = attractor(
            storage,
            game,
            opponent,
            &inner.winning[opponent.to_index()],
            v_set,
            &vplayer,
            &empty,
        );
        let rest2 = minus(storage, v_set, &b);
        let mut inner2 = zielonka(storage, game, &rest2)?;

        win = [empty.clone(), empty.clone()];
        win[opponent.to_index()] = union(storage, &inner2.winning[opponent.to_index()], &b);
        win[alpha.to_index()] = std::mem::take(&mut inner2.winning[alpha.to_index()]);

        win_strategy = [Strategy::new(), Strategy::new()];
        win_strategy[opponent.to_index()] =
            merge_strategy(b_strategy, std::mem::take(&mut inner2.strategy[opponent.to_index()]));
        win_strategy[alpha.to_index()] = std::mem::take(&mut inner2.strategy[alpha.to_index()]);
    }

    debug_assert_eq!(union(storage, &win[0], &win[1]), *v_set);

    Ok(Solution { winning: win, strategy: win_strategy })
}

fn merge_strategy(mut a: Strategy, b: Strategy) -> Strategy {
    a.extend(b);
    a
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use symck_ldd::from_iter;

    use super::*;
    use crate::FixpointSymbol;
    use crate::PbesEquationIndex;
    use symck_symbolic::Reachable;
    use symck_symbolic::SummandGroup;

    #[test]
    fn test_zielonka_on_single_vertex_game() {
        let mut storage = Storage::new();

        // A single, self-looping, disjunctive (even) vertex: its owner wins by looping forever.
        let states = from_iter(&mut storage, [vec![0]].iter());
        let reachable = Reachable::new(states.clone(), 1, None);

        let equations = vec![("X".to_string(), FixpointSymbol::Nu, false)];
        let equation_index = PbesEquationIndex::new(&equations);

        let mut tag_name = HashMap::new();
        tag_name.insert(0, "X".to_string());

        let groups: Vec<SummandGroup> = Vec::new();
        let game = SymbolicParityGame::new(&reachable, &groups, &equation_index, tag_name);

        let solution = zielonka(&mut storage, &game, &states).unwrap();
        assert_eq!(union(&mut storage, &solution.winning[0], &solution.winning[1]), states);
    }
}
