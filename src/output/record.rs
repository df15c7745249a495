//! Serialized sample shapes shared by the JSONL and protobuf writers and by
//! the on-disk grid cells.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{ReachabilityEdge, ReachabilityGraph};
use crate::net::{Idx, IndexVec, Marking, NetError, PetriNet, Tokens, TransitionId, VertexId};
use crate::sample::Sample;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Net(#[from] NetError),
    #[error("vertex {index} has {len} entries, expected {places}")]
    VertexWidth {
        index: usize,
        len: usize,
        places: usize,
    },
    #[error("edge endpoint {index} out of range for {vertices} vertices")]
    VertexIndex { index: usize, vertices: usize },
    #[error("arc transition {index} out of range for {transitions} transitions")]
    TransitionIndex { index: usize, transitions: usize },
    #[error("{edges} edges but {arcs} arc transitions")]
    ArcMismatch { edges: usize, arcs: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetriNetRecord {
    pub places: usize,
    pub transitions: usize,
    /// Row-major flattened `P x (2T + 1)` matrix `[pre | post | marking]`.
    pub matrix: Vec<Tokens>,
}

impl From<&PetriNet> for PetriNetRecord {
    fn from(net: &PetriNet) -> Self {
        Self {
            places: net.places(),
            transitions: net.transitions(),
            matrix: net.flatten(),
        }
    }
}

impl PetriNetRecord {
    pub fn to_net(&self) -> Result<PetriNet, RecordError> {
        Ok(PetriNet::from_flat(
            self.places,
            self.transitions,
            &self.matrix,
        )?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphRecord {
    pub vertices: Vec<Vec<Tokens>>,
    pub edges: Vec<[usize; 2]>,
    pub arc_transitions: Vec<usize>,
    pub bounded: bool,
}

impl From<&ReachabilityGraph> for GraphRecord {
    fn from(graph: &ReachabilityGraph) -> Self {
        Self {
            vertices: graph
                .markings
                .iter()
                .map(|marking| marking.0.as_slice().to_vec())
                .collect(),
            edges: graph
                .edges
                .iter()
                .map(|edge| [edge.source.index(), edge.target.index()])
                .collect(),
            arc_transitions: graph
                .edges
                .iter()
                .map(|edge| edge.transition.index())
                .collect(),
            bounded: graph.bounded,
        }
    }
}

impl GraphRecord {
    /// Rebuilds the graph, validating indices against the vertex set and the
    /// net's transition count.
    pub fn to_graph(&self, transitions: usize) -> Result<ReachabilityGraph, RecordError> {
        if self.edges.len() != self.arc_transitions.len() {
            return Err(RecordError::ArcMismatch {
                edges: self.edges.len(),
                arcs: self.arc_transitions.len(),
            });
        }
        let places = self.vertices.first().map(|v| v.len()).unwrap_or_default();
        let mut markings = IndexVec::new();
        for (index, vertex) in self.vertices.iter().enumerate() {
            if vertex.len() != places {
                return Err(RecordError::VertexWidth {
                    index,
                    len: vertex.len(),
                    places,
                });
            }
            markings.push(Marking(IndexVec::from_vec(vertex.clone())));
        }

        let vertices = self.vertices.len();
        let mut edges = Vec::with_capacity(self.edges.len());
        for (&[src, dst], &arc) in self.edges.iter().zip(&self.arc_transitions) {
            for endpoint in [src, dst] {
                if endpoint >= vertices {
                    return Err(RecordError::VertexIndex {
                        index: endpoint,
                        vertices,
                    });
                }
            }
            if arc >= transitions {
                return Err(RecordError::TransitionIndex {
                    index: arc,
                    transitions,
                });
            }
            edges.push(ReachabilityEdge {
                source: VertexId::from_usize(src),
                transition: TransitionId::from_usize(arc),
                target: VertexId::from_usize(dst),
            });
        }

        Ok(ReachabilityGraph {
            markings,
            edges,
            bounded: self.bounded,
        })
    }
}

/// One output line / frame of the dataset.
///
/// The analysis fields are absent on the raw records the grid partitioner
/// consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRecord {
    pub petri_net: PetriNetRecord,
    pub reachability_graph: GraphRecord,
    #[serde(default)]
    pub lambda_values: Option<Vec<f64>>,
    #[serde(default)]
    pub steady_state_probs: Option<Vec<f64>>,
    #[serde(default)]
    pub average_markings: Option<Vec<f64>>,
    #[serde(default)]
    pub marking_densities: Option<Vec<Vec<f64>>>,
}

impl SampleRecord {
    pub fn from_sample(sample: &Sample) -> Self {
        Self {
            petri_net: PetriNetRecord::from(&sample.net),
            reachability_graph: GraphRecord::from(&sample.graph),
            lambda_values: Some(sample.firing_rates.iter().copied().collect()),
            steady_state_probs: Some(sample.analysis.steady_state_probs.clone()),
            average_markings: Some(sample.analysis.average_markings.clone()),
            marking_densities: Some(sample.analysis.marking_densities.clone()),
        }
    }

    /// A record without analysis results, as written by the raw grid phase.
    pub fn raw(net: &PetriNet, graph: &ReachabilityGraph) -> Self {
        Self {
            petri_net: PetriNetRecord::from(net),
            reachability_graph: GraphRecord::from(graph),
            lambda_values: None,
            steady_state_probs: None,
            average_markings: None,
            marking_densities: None,
        }
    }
}
