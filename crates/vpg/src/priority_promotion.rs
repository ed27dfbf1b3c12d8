//! Region-based priority-promotion solver (Benerecetti, Dell'Erba, Mogavero) for explicit
//! parity games.
//!
//! Instead of repeatedly shrinking the game by removing solved dominions (which would require
//! reallocating the graph every time), the solver keeps the whole game fixed and tracks, per
//! vertex, a `region_function` giving the priority of the subgame it currently belongs to, plus
//! an `m_unsolved` list of the vertices not yet assigned to a found dominion. A region is
//! promoted to a special `COMPUTED_REGION` marker once its dominion has been confirmed.

use std::collections::VecDeque;

use log::debug;

use crate::ParityGame;
use crate::Player;
use crate::Predecessors;
use crate::VertexIndex;

/// Marks a vertex as belonging to an already-confirmed dominion, outside of every subgame.
const COMPUTED_REGION: i64 = -1;

/// A positional strategy for an explicit parity game: `None` for a vertex without a recorded
/// successor, either because it is still unsolved or because it belongs to the opponent in an
/// open region.
pub type Strategy = Vec<Option<VertexIndex>>;

/// Solves the given parity game using the priority-promotion algorithm, returning the winner of
/// the initial vertex.
pub fn solve_priority_promotion(game: &ParityGame) -> Player {
    let mut solver = PriorityPromotionSolver::new(game);
    let (winner, _strategy) = solver.solve();

    winner[*game.initial_vertex()].expect("every vertex is assigned to a dominion by the time solve() returns")
}

struct PriorityPromotionSolver<'a> {
    game: &'a ParityGame,
    predecessors: Predecessors,

    /// The vertices not yet part of a confirmed dominion.
    m_unsolved: Vec<VertexIndex>,

    /// The number of vertices currently assigned to each priority-indexed region.
    m_regions: Vec<usize>,

    m_dominions: usize,
    m_promotions: usize,
}

impl<'a> PriorityPromotionSolver<'a> {
    fn new(game: &'a ParityGame) -> Self {
        PriorityPromotionSolver {
            game,
            predecessors: Predecessors::new(game),
            m_unsolved: Vec::new(),
            m_regions: Vec::new(),
            m_dominions: 0,
            m_promotions: 0,
        }
    }

    fn solve(&mut self) -> (Vec<Option<Player>>, Strategy) {
        let num_of_vertices = self.game.num_of_vertices();
        let mut region_function: Vec<i64> = vec![0; num_of_vertices];
        let mut strategy: Strategy = vec![None; num_of_vertices];
        let mut winner: Vec<Option<Player>> = vec![None; num_of_vertices];

        self.m_unsolved = self.game.iter_vertices().collect();

        let mut lowest_region = 0;
        for v in self.game.iter_vertices() {
            region_function[*v] = *self.game.priority(v) as i64;
            lowest_region = lowest_region.max(*self.game.priority(v));
        }

        self.m_regions = vec![0; lowest_region + 1];
        for &r in &region_function {
            self.m_regions[r as usize] += 1;
        }

        let mut prio = self.next_priority(0);

        loop {
            self.query(&mut region_function, &mut strategy, prio);

            if self.is_open(&region_function, prio, true) {
                debug!("newly computed region is open in the subgame, with p = {}", prio);
                prio = self.next_priority(prio + 1);
                continue;
            }

            if !self.is_open(&region_function, prio, false) {
                let mut todo: VecDeque<VertexIndex> = VecDeque::new();
                for &v in &self.m_unsolved {
                    if region_function[*v] == prio as i64 {
                        todo.push_back(v);
                    }
                }

                self.compute_attractor(&mut region_function, &mut strategy, prio, &mut todo, false);

                debug!("found the dominion D, with p = {}", prio);
                self.m_dominions += 1;
                let dominion_winner = if prio % 2 == 0 { Player::Even } else { Player::Odd };

                self.m_unsolved.clear();
                self.m_regions.fill(0);

                for v in self.game.iter_vertices() {
                    if region_function[*v] == prio as i64 {
                        region_function[*v] = COMPUTED_REGION;
                        winner[*v] = Some(dominion_winner);
                    } else if region_function[*v] != COMPUTED_REGION {
                        region_function[*v] = *self.game.priority(v) as i64;
                        strategy[*v] = None;

                        self.m_unsolved.push(v);
                        self.m_regions[*self.game.priority(v)] += 1;
                    }
                }

                if self.m_unsolved.is_empty() {
                    break;
                }

                prio = self.next_priority(0);
            } else {
                debug!("promoted dominion D, with p = {}", prio);
                prio = self.promote_sub_dominion(&mut region_function, &mut strategy, prio);
            }
        }

        debug!("{} dominions found, and {} promotions required", self.m_dominions, self.m_promotions);
        (winner, strategy)
    }

    /// `R* = region_function^-1(prio)`: seeds the attractor computation with the vertices newly
    /// assigned to `prio`, then computes the attractor of that set within the subgame `G >= prio`.
    fn query(&mut self, region_function: &mut [i64], strategy: &mut Strategy, prio: usize) {
        let mut todo: VecDeque<VertexIndex> = VecDeque::new();
        for &v in &self.m_unsolved {
            if region_function[*v] == prio as i64 {
                todo.push_back(v);
            }
        }

        self.compute_attractor(region_function, strategy, prio, &mut todo, true);
    }

    /// Computes the attractor set for the player owning `prio`, restricted to the subgame
    /// `G >= prio` when `in_subgraph` holds, and to the whole graph (ignoring already-computed
    /// regions) otherwise.
    fn compute_attractor(
        &mut self,
        region_function: &mut [i64],
        strategy: &mut Strategy,
        prio: usize,
        todo: &mut VecDeque<VertexIndex>,
        in_subgraph: bool,
    ) {
        let alpha = if prio % 2 == 0 { Player::Even } else { Player::Odd };

        while let Some(w) = todo.pop_front() {
            for v in self.predecessors.predecessors(w).collect::<Vec<_>>() {
                if region_function[*v] == prio as i64
                    || region_function[*v] == COMPUTED_REGION
                    || (in_subgraph && region_function[*v] < prio as i64)
                {
                    continue;
                }

                if self.game.owner(v) == alpha {
                    strategy[*v] = Some(w);
                } else {
                    let mut is_subset = true;
                    for x in self.game.outgoing_edges(v) {
                        if region_function[*x] == prio as i64 || region_function[*x] == COMPUTED_REGION {
                            continue;
                        }
                        if region_function[*x] > prio as i64 || !in_subgraph {
                            is_subset = false;
                            break;
                        }
                    }

                    if is_subset {
                        strategy[*v] = None;
                    } else {
                        continue;
                    }
                }

                self.m_regions[region_function[*v] as usize] -= 1;
                self.m_regions[prio] += 1;

                region_function[*v] = prio as i64;
                todo.push_back(v);
            }
        }

        // Vertices belonging to alpha that joined the region without a recorded strategy (e.g.
        // they were already in it before this call) can pick an arbitrary successor in the region.
        for &v in &self.m_unsolved {
            if region_function[*v] == prio as i64 && self.game.owner(v) == alpha && strategy[*v].is_none() {
                for w in self.game.outgoing_edges(v) {
                    if region_function[*w] == prio as i64 {
                        strategy[*v] = Some(w);
                    }
                }
            }
        }
    }

    /// Checks whether the region with priority `prio` is open: some opponent-owned vertex in it
    /// can escape outside the region (or outside the subgame, when `in_subgraph` holds), or some
    /// `alpha`-owned vertex in it has no successor inside the region.
    fn is_open(&self, region_function: &[i64], prio: usize, in_subgraph: bool) -> bool {
        let alpha = if prio % 2 == 0 { Player::Even } else { Player::Odd };

        for &v in &self.m_unsolved {
            if region_function[*v] != prio as i64 {
                continue;
            }

            if self.game.owner(v) != alpha {
                for u in self.game.outgoing_edges(v) {
                    let escapes = region_function[*u] != COMPUTED_REGION
                        && ((in_subgraph && region_function[*u] > prio as i64) || (!in_subgraph && region_function[*u] != prio as i64));
                    if escapes {
                        return true;
                    }
                }
            } else {
                let mut closed = false;
                for u in self.game.outgoing_edges(v) {
                    if region_function[*u] == prio as i64 {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return true;
                }
            }
        }

        false
    }

    /// Promotes the region at `prio` to the best escape priority the opponent can flee to: the
    /// highest priority strictly below `prio` reachable from some opponent vertex in the region.
    /// Every vertex at a priority above the promotion target is reset to its original priority.
    fn promote_sub_dominion(&mut self, region_function: &mut [i64], strategy: &mut Strategy, prio: usize) -> usize {
        let alpha = if prio % 2 == 0 { Player::Even } else { Player::Odd };

        let mut promotion = 0usize;
        for &v in &self.m_unsolved {
            if region_function[*v] == prio as i64 && self.game.owner(v) != alpha {
                for u in self.game.outgoing_edges(v) {
                    if region_function[*u] < prio as i64 {
                        promotion = promotion.max(region_function[*u] as usize);
                    }
                }
            }
        }

        self.m_promotions += 1;

        for &v in &self.m_unsolved {
            if region_function[*v] == prio as i64 {
                region_function[*v] = promotion as i64;
                self.m_regions[promotion] += 1;
            } else if region_function[*v] > promotion as i64 {
                self.m_regions[region_function[*v] as usize] -= 1;

                region_function[*v] = *self.game.priority(v) as i64;
                strategy[*v] = None;

                self.m_regions[*self.game.priority(v)] += 1;
            }
        }

        self.m_regions[prio] = 0;
        promotion
    }

    /// Finds the lowest priority greater than or equal to `prio` that has at least one vertex.
    fn next_priority(&self, mut prio: usize) -> usize {
        while self.m_regions[prio] == 0 {
            prio += 1;
            debug_assert!(prio < self.m_regions.len());
        }
        prio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Priority;

    #[test]
    fn test_self_loop_even_wins() {
        // A single even-owned vertex with priority 0, looping to itself: even wins trivially.
        let game = ParityGame::new(
            VertexIndex::new(0),
            vec![Player::Even],
            vec![Priority::new(0)],
            vec![0, 1],
            vec![VertexIndex::new(0)],
        );

        assert_eq!(solve_priority_promotion(&game), Player::Even);
    }

    #[test]
    fn test_two_vertex_game_matches_zielonka() {
        // 0 (even, prio 0) -> 1 (odd, prio 1) -> 0: even can force the loop through vertex 0.
        let game = ParityGame::new(
            VertexIndex::new(0),
            vec![Player::Even, Player::Odd],
            vec![Priority::new(0), Priority::new(1)],
            vec![0, 1, 2],
            vec![VertexIndex::new(1), VertexIndex::new(0)],
        );

        assert_eq!(solve_priority_promotion(&game), crate::solve_zielonka(&game));
    }
}
