//! Per-place marginal statistics under the steady-state distribution.
use crate::graph::ReachabilityGraph;
use crate::net::{Idx, Tokens, VertexId};

/// Expected token count per place: `avg[p] = Σ_i m_i[p] · π_i`.
pub fn average_markings(graph: &ReachabilityGraph, probs: &[f64]) -> Vec<f64> {
    if graph.num_vertices() == 0 {
        return Vec::new();
    }
    let places = graph.marking(VertexId::new(0)).len();
    let mut avg = vec![0.0; places];
    for (vertex, marking) in graph.markings.iter_enumerated() {
        let weight = probs[vertex.index()];
        for (place, &tokens) in marking.iter() {
            avg[place.index()] += tokens as f64 * weight;
        }
    }
    avg
}

/// Largest token count observed in any vertex of the graph.
pub fn max_token_count(graph: &ReachabilityGraph) -> Tokens {
    graph
        .markings
        .iter()
        .flat_map(|marking| marking.0.iter().copied())
        .max()
        .unwrap_or(0)
}

/// Per-place distribution over token counts: `density[p][k] = P(m[p] = k)`.
///
/// Rows span `k ∈ [0, K]` with `K` the maximum observed token count, and sum
/// to 1 up to the clamp adjustment of the solve.
pub fn marking_densities(graph: &ReachabilityGraph, probs: &[f64]) -> Vec<Vec<f64>> {
    if graph.num_vertices() == 0 {
        return Vec::new();
    }
    let places = graph.marking(VertexId::new(0)).len();
    let width = max_token_count(graph) as usize + 1;
    let mut densities = vec![vec![0.0; width]; places];
    for (vertex, marking) in graph.markings.iter_enumerated() {
        let weight = probs[vertex.index()];
        for (place, &tokens) in marking.iter() {
            densities[place.index()][tokens as usize] += weight;
        }
    }
    densities
}
