use crate::ParityGame;
use crate::VertexIndex;

/// A reversed-edge (predecessor) view of a [`ParityGame`], built once and reused by the
/// Zielonka and priority-promotion solvers, which both need to walk edges backwards.
pub struct Predecessors {
    /// Offsets into `edges_from` for every vertex, plus a sentinel at the end.
    offsets: Vec<usize>,

    /// For each vertex (in CSR order), the vertices that have an edge into it.
    edges_from: Vec<VertexIndex>,
}

impl Predecessors {
    /// Computes the predecessor relation of the given parity game.
    pub fn new(game: &ParityGame) -> Self {
        let num_of_vertices = game.num_of_vertices();
        let mut in_degree = vec![0usize; num_of_vertices];

        for v in game.iter_vertices() {
            for w in game.outgoing_edges(v) {
                in_degree[*w] += 1;
            }
        }

        let mut offsets = Vec::with_capacity(num_of_vertices + 1);
        let mut offset = 0;
        for degree in &in_degree {
            offsets.push(offset);
            offset += degree;
        }
        offsets.push(offset);

        let mut edges_from = vec![VertexIndex::new(0); offset];
        let mut cursor = offsets.clone();
        for v in game.iter_vertices() {
            for w in game.outgoing_edges(v) {
                edges_from[cursor[*w]] = v;
                cursor[*w] += 1;
            }
        }

        Self { offsets, edges_from }
    }

    /// Returns an iterator over the predecessors of the given vertex.
    pub fn predecessors(&self, vertex: VertexIndex) -> impl Iterator<Item = VertexIndex> + '_ {
        let start = self.offsets[*vertex];
        let end = self.offsets[*vertex + 1];
        self.edges_from[start..end].iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Player;
    use crate::Priority;

    #[test]
    fn test_predecessors() {
        // 0 -> 1, 0 -> 2, 1 -> 2
        let game = ParityGame::new(
            VertexIndex::new(0),
            vec![Player::Even; 3],
            vec![Priority::new(0); 3],
            vec![0, 2, 3, 3],
            vec![VertexIndex::new(1), VertexIndex::new(2), VertexIndex::new(2)],
        );

        let predecessors = Predecessors::new(&game);
        assert_eq!(predecessors.predecessors(VertexIndex::new(0)).count(), 0);
        assert_eq!(predecessors.predecessors(VertexIndex::new(1)).collect::<Vec<_>>(), vec![VertexIndex::new(0)]);

        let mut preds_2: Vec<_> = predecessors.predecessors(VertexIndex::new(2)).collect();
        preds_2.sort();
        assert_eq!(preds_2, vec![VertexIndex::new(0), VertexIndex::new(1)]);
    }
}
