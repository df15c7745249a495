//! CTMC construction, steady-state solving and marginal statistics.

pub mod ctmc;
pub mod marginals;
pub mod solver;

pub use ctmc::{state_equation, steady_state};
pub use marginals::{average_markings, marking_densities, max_token_count};
pub use solver::{DenseMatrix, DenseSolver, LuSolver, SolveError};

use crate::graph::ReachabilityGraph;
use crate::net::{IndexVec, TransitionId};

/// Steady-state analysis results for one sample.
#[derive(Debug, Clone)]
pub struct SpnAnalysis {
    pub steady_state_probs: Vec<f64>,
    pub average_markings: Vec<f64>,
    pub marking_densities: Vec<Vec<f64>>,
}

/// Runs the full analysis: steady-state solve plus marginals.
pub fn analyze(
    graph: &ReachabilityGraph,
    rates: &IndexVec<TransitionId, f64>,
    solver: &dyn DenseSolver,
) -> Result<SpnAnalysis, SolveError> {
    let probs = steady_state(graph, rates, solver)?;
    let average_markings = marginals::average_markings(graph, &probs);
    let marking_densities = marginals::marking_densities(graph, &probs);
    Ok(SpnAnalysis {
        steady_state_probs: probs,
        average_markings,
        marking_densities,
    })
}
