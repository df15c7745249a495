use crate::analysis::SpnAnalysis;
use crate::graph::ReachabilityGraph;
use crate::net::{IndexVec, PetriNet, TransitionId};

/// One dataset sample: a net, its reachability graph, the firing rates and
/// the steady-state analysis.
#[derive(Debug, Clone)]
pub struct Sample {
    pub net: PetriNet,
    pub graph: ReachabilityGraph,
    pub firing_rates: IndexVec<TransitionId, f64>,
    pub analysis: SpnAnalysis,
}
