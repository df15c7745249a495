//! Breadth-first marking exploration with boundedness detection.
use std::collections::hash_map::Entry;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::net::{Idx, IndexVec, Incidence, Marking, PetriNet, Tokens, TransitionId, VertexId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachabilityEdge {
    pub source: VertexId,
    pub transition: TransitionId,
    pub target: VertexId,
}

/// A directed multigraph over reachable markings.
///
/// Vertex indices reflect BFS discovery order; vertex 0 is the initial
/// marking. Parallel edges are permitted. `bounded` is false when a successor
/// exceeded the per-place token ceiling or when the vertex count reached the
/// exploration cap before the queue drained.
#[derive(Debug, Clone)]
pub struct ReachabilityGraph {
    pub markings: IndexVec<VertexId, Marking>,
    pub edges: Vec<ReachabilityEdge>,
    pub bounded: bool,
}

impl ReachabilityGraph {
    pub fn num_vertices(&self) -> usize {
        self.markings.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn marking(&self, vertex: VertexId) -> &Marking {
        &self.markings[vertex]
    }
}

/// Explores the reachability graph of `net` by BFS.
///
/// The vertex-cap check runs on the popped vertex before expansion, so a net
/// with exactly `max_markings` reachable markings is reported unbounded.
/// Edges leaving one source vertex appear in ascending transition order.
pub fn explore(net: &PetriNet, place_upper_bound: Tokens, max_markings: usize) -> ReachabilityGraph {
    let delta = net.change_matrix();

    let mut graph = ReachabilityGraph {
        markings: IndexVec::new(),
        edges: Vec::new(),
        bounded: true,
    };
    let mut visited = FxHashMap::<Marking, VertexId>::default();
    let mut queue = VecDeque::new();

    let initial = net.initial_marking_vec();
    let root = graph.markings.push(initial.clone());
    visited.insert(initial, root);
    queue.push_back(root);

    'bfs: while let Some(current) = queue.pop_front() {
        if graph.markings.len() >= max_markings {
            graph.bounded = false;
            break;
        }
        let marking = graph.markings[current].clone();

        for t in 0..net.transitions() {
            let transition = TransitionId::from_usize(t);
            if !is_enabled(net, &marking, transition) {
                continue;
            }
            let next = fire(&marking, &delta, transition);
            if next.iter().any(|(_, &tokens)| tokens > place_upper_bound) {
                graph.bounded = false;
                break 'bfs;
            }
            let target = match visited.entry(next.clone()) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let idx = graph.markings.push(next);
                    entry.insert(idx);
                    queue.push_back(idx);
                    idx
                }
            };
            graph.edges.push(ReachabilityEdge {
                source: current,
                transition,
                target,
            });
        }
    }

    graph
}

fn is_enabled(net: &PetriNet, marking: &Marking, transition: TransitionId) -> bool {
    net.pre()
        .rows()
        .iter_enumerated()
        .all(|(place, row)| marking.tokens(place) >= row[transition.index()])
}

fn fire(marking: &Marking, delta: &Incidence<i32>, transition: TransitionId) -> Marking {
    let mut next = marking.clone();
    for (place, row) in delta.rows().iter_enumerated() {
        let change = row[transition.index()];
        if change != 0 {
            let tokens = next.tokens_mut(place);
            *tokens = (*tokens as i64 + change as i64) as Tokens;
        }
    }
    next
}
