//! Infinitesimal-generator assembly and the steady-state solve.
use crate::analysis::solver::{DenseMatrix, DenseSolver, SolveError};
use crate::graph::ReachabilityGraph;
use crate::net::{Idx, IndexVec, TransitionId};

/// Threshold below which the probability mass is left unnormalized.
const NORMALIZATION_FLOOR: f64 = 1e-9;

/// Builds the `(V + 1) x V` state equation `A π = b`.
///
/// Columns follow `Qᵀ`: column `j` carries the total outflow rate of state
/// `j` on the diagonal (negative) and the inflow into other states
/// off-diagonal. Parallel edges accumulate. Row `V` is the normalization
/// constraint `Σ π_i = 1`.
pub fn state_equation(
    graph: &ReachabilityGraph,
    rates: &IndexVec<TransitionId, f64>,
) -> (DenseMatrix, Vec<f64>) {
    let v = graph.num_vertices();
    let mut a = DenseMatrix::zeros(v + 1, v);

    for edge in &graph.edges {
        let rate = rates[edge.transition];
        let src = edge.source.index();
        let dst = edge.target.index();
        *a.at_mut(src, src) -= rate;
        *a.at_mut(dst, src) += rate;
    }
    for col in 0..v {
        *a.at_mut(v, col) = 1.0;
    }

    let mut b = vec![0.0; v + 1];
    b[v] = 1.0;
    (a, b)
}

/// Solves for the steady-state distribution of the chain.
///
/// The generator has rank `V - 1` for an irreducible chain, so its first row
/// is dropped and the normalization row takes its place, leaving a square
/// system. Negative entries (numerical noise) are clamped to zero before the
/// mass is renormalized.
pub fn steady_state(
    graph: &ReachabilityGraph,
    rates: &IndexVec<TransitionId, f64>,
    solver: &dyn DenseSolver,
) -> Result<Vec<f64>, SolveError> {
    let v = graph.num_vertices();
    if v == 0 {
        return Ok(Vec::new());
    }

    let (a, b) = state_equation(graph, rates);
    let mut square = DenseMatrix::zeros(v, v);
    for row in 1..=v {
        for col in 0..v {
            *square.at_mut(row - 1, col) = a.at(row, col);
        }
    }
    let rhs = &b[1..];

    let mut probs = solver.solve_dense(&square, rhs)?;
    for p in probs.iter_mut() {
        if *p < 0.0 {
            *p = 0.0;
        }
    }
    let total: f64 = probs.iter().sum();
    if total > NORMALIZATION_FLOOR {
        for p in probs.iter_mut() {
            *p /= total;
        }
    }
    Ok(probs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::solver::LuSolver;
    use crate::graph::explore;
    use crate::net::{PetriNet, PlaceId};

    fn two_state_cycle() -> ReachabilityGraph {
        let mut net = PetriNet::new(2, 2);
        net.set_pre(PlaceId::new(0), TransitionId::new(0), 1);
        net.set_post(PlaceId::new(1), TransitionId::new(0), 1);
        net.set_pre(PlaceId::new(1), TransitionId::new(1), 1);
        net.set_post(PlaceId::new(0), TransitionId::new(1), 1);
        net.set_initial_tokens(PlaceId::new(0), 1);
        explore(&net, 5, 100)
    }

    #[test]
    fn absorbing_chain_puts_all_mass_on_sink() {
        let mut net = PetriNet::new(2, 1);
        net.set_pre(PlaceId::new(0), TransitionId::new(0), 1);
        net.set_post(PlaceId::new(1), TransitionId::new(0), 1);
        net.set_initial_tokens(PlaceId::new(0), 1);
        let graph = explore(&net, 5, 100);

        let rates = IndexVec::from_vec(vec![1.0]);
        let probs = steady_state(&graph, &rates, &LuSolver::default()).unwrap();
        assert!((probs[0] - 0.0).abs() < 1e-9);
        assert!((probs[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn symmetric_cycle_splits_mass_evenly() {
        let graph = two_state_cycle();
        let rates = IndexVec::from_vec(vec![1.0, 1.0]);

        let probs = steady_state(&graph, &rates, &LuSolver::default()).unwrap();
        assert!((probs[0] - 0.5).abs() < 1e-9);
        assert!((probs[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    fn asymmetric_cycle_weights_by_rates() {
        let graph = two_state_cycle();
        let rates = IndexVec::from_vec(vec![2.0, 1.0]);

        let probs = steady_state(&graph, &rates, &LuSolver::default()).unwrap();
        assert!((probs[0] - 1.0 / 3.0).abs() < 1e-9);
        assert!((probs[1] - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn parallel_edges_accumulate_rates() {
        // Two transitions both moving p0 -> p1 plus one moving back.
        let mut net = PetriNet::new(2, 3);
        for t in [0, 1] {
            net.set_pre(PlaceId::new(0), TransitionId::new(t), 1);
            net.set_post(PlaceId::new(1), TransitionId::new(t), 1);
        }
        net.set_pre(PlaceId::new(1), TransitionId::new(2), 1);
        net.set_post(PlaceId::new(0), TransitionId::new(2), 1);
        net.set_initial_tokens(PlaceId::new(0), 1);
        let graph = explore(&net, 5, 100);
        assert_eq!(graph.num_edges(), 3);

        let rates = IndexVec::from_vec(vec![1.0, 1.0, 1.0]);
        let (a, _) = state_equation(&graph, &rates);
        assert!((a.at(0, 0) + 2.0).abs() < 1e-12);
        assert!((a.at(1, 0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let graph = two_state_cycle();
        let rates = IndexVec::from_vec(vec![3.0, 7.0]);

        let probs = steady_state(&graph, &rates, &LuSolver::default()).unwrap();
        let total: f64 = probs.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(probs.iter().all(|&p| p >= 0.0));
    }
}
