use std::collections::HashMap;
use std::hash::Hash;

/// Finds a canonical representative for the strongly connected component of `u0` in the graph
/// induced by `successors`, by exploring only along confluent-tau edges.
///
/// Iterative version of Tarjan's algorithm (ported from
/// <https://llbit.se/?p=3379>, as used by the original `find_representative`): returns the
/// smallest node of the first terminal SCC discovered. In a confluent-tau graph there is only
/// one terminal SCC reachable from any given state, so every state in it maps to the same
/// representative, collapsing confluent tau-cycles to a single canonical state.
pub fn find_representative<N, F>(u0: N, mut successors: F) -> N
where
    N: Clone + Eq + Hash + Ord,
    F: FnMut(&N) -> Vec<N>,
{
    let mut stack: Vec<N> = Vec::new();
    let mut low: HashMap<N, usize> = HashMap::new();
    let mut disc: HashMap<N, usize> = HashMap::new();
    let mut succ_cache: HashMap<N, Vec<N>> = HashMap::new();
    let mut work: Vec<(N, usize)> = Vec::new();

    succ_cache.insert(u0.clone(), successors(&u0));
    work.push((u0, 0));

    while let Some((u, i)) = work.pop() {
        if i == 0 {
            let k = disc.len();
            disc.insert(u.clone(), k);
            low.insert(u.clone(), k);
            stack.push(u.clone());
        }

        let mut recurse = false;
        let succ = succ_cache[&u].clone();
        for (j, v) in succ.iter().enumerate().skip(i) {
            if !disc.contains_key(v) {
                succ_cache.insert(v.clone(), successors(v));
                work.push((u.clone(), j + 1));
                work.push((v.clone(), 0));
                recurse = true;
                break;
            } else if stack.contains(v) {
                let d = disc[v];
                let l = low.get_mut(&u).expect("u was pushed onto the work list with a low-link entry");
                *l = (*l).min(d);
            }
        }
        if recurse {
            continue;
        }

        if disc[&u] == low[&u] {
            let mut result = u.clone();
            loop {
                let v = stack.last().expect("the SCC containing u has not been fully popped yet").clone();
                if v == u {
                    break;
                }
                if v < result {
                    result = v;
                }
                stack.pop();
            }
            return result;
        }

        if let Some((parent, _)) = work.last() {
            let v_low = low[&u];
            let parent_low = low.get_mut(parent).expect("parent is still on the work list");
            *parent_low = (*parent_low).min(v_low);
        }
    }

    panic!("find_representative did not find a solution")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_node_is_its_own_representative() {
        let rep = find_representative(0, |_| Vec::<i32>::new());
        assert_eq!(rep, 0);
    }

    #[test]
    fn test_cycle_collapses_to_smallest_member() {
        // 2 -> 0 -> 1 -> 2: a single confluent-tau cycle, representative is the smallest state.
        let successors = |u: &i32| match u {
            0 => vec![1],
            1 => vec![2],
            2 => vec![0],
            _ => unreachable!(),
        };
        assert_eq!(find_representative(2, successors), 0);
        assert_eq!(find_representative(0, successors), 0);
        assert_eq!(find_representative(1, successors), 0);
    }

    #[test]
    fn test_chain_leads_into_terminal_cycle() {
        // 0 -> 1 -> 2 -> 1: the terminal SCC is {1, 2}, representative 1.
        let successors = |u: &i32| match u {
            0 => vec![1],
            1 => vec![2],
            2 => vec![1],
            _ => unreachable!(),
        };
        assert_eq!(find_representative(0, successors), 1);
    }
}
