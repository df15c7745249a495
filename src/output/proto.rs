//! Protocol-buffer schema mirroring the JSONL shape, written as raw
//! concatenated frames.
use std::io::Write;

use prost::Message;

use crate::output::{OutputError, SampleRecord, SampleWriter};

#[derive(Clone, PartialEq, Message)]
pub struct PetriNet {
    #[prost(int32, tag = "1")]
    pub places: i32,
    #[prost(int32, tag = "2")]
    pub transitions: i32,
    #[prost(int32, repeated, tag = "3")]
    pub matrix: Vec<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Vertex {
    #[prost(int32, repeated, tag = "1")]
    pub marking: Vec<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Edge {
    #[prost(int32, tag = "1")]
    pub src: i32,
    #[prost(int32, tag = "2")]
    pub dest: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct ReachabilityGraph {
    #[prost(message, repeated, tag = "1")]
    pub vertices: Vec<Vertex>,
    #[prost(message, repeated, tag = "2")]
    pub edges: Vec<Edge>,
    #[prost(int32, repeated, tag = "3")]
    pub arc_transitions: Vec<i32>,
}

#[derive(Clone, PartialEq, Message)]
pub struct MarkingDensity {
    #[prost(double, repeated, tag = "1")]
    pub densities: Vec<f64>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SpnData {
    #[prost(message, optional, tag = "1")]
    pub petri_net: Option<PetriNet>,
    #[prost(message, optional, tag = "2")]
    pub reachability_graph: Option<ReachabilityGraph>,
    #[prost(double, repeated, tag = "3")]
    pub lambda_values: Vec<f64>,
    #[prost(double, repeated, tag = "4")]
    pub steady_state_probs: Vec<f64>,
    #[prost(double, repeated, tag = "5")]
    pub average_markings: Vec<f64>,
    #[prost(message, repeated, tag = "6")]
    pub marking_densities: Vec<MarkingDensity>,
}

impl From<&SampleRecord> for SpnData {
    fn from(record: &SampleRecord) -> Self {
        let net = &record.petri_net;
        let graph = &record.reachability_graph;
        Self {
            petri_net: Some(PetriNet {
                places: net.places as i32,
                transitions: net.transitions as i32,
                matrix: net.matrix.iter().map(|&v| v as i32).collect(),
            }),
            reachability_graph: Some(ReachabilityGraph {
                vertices: graph
                    .vertices
                    .iter()
                    .map(|marking| Vertex {
                        marking: marking.iter().map(|&v| v as i32).collect(),
                    })
                    .collect(),
                edges: graph
                    .edges
                    .iter()
                    .map(|&[src, dest]| Edge {
                        src: src as i32,
                        dest: dest as i32,
                    })
                    .collect(),
                arc_transitions: graph.arc_transitions.iter().map(|&t| t as i32).collect(),
            }),
            lambda_values: record.lambda_values.clone().unwrap_or_default(),
            steady_state_probs: record.steady_state_probs.clone().unwrap_or_default(),
            average_markings: record.average_markings.clone().unwrap_or_default(),
            marking_densities: record
                .marking_densities
                .clone()
                .unwrap_or_default()
                .into_iter()
                .map(|densities| MarkingDensity { densities })
                .collect(),
        }
    }
}

pub struct ProtobufWriter<W> {
    inner: W,
}

impl<W: Write> ProtobufWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> SampleWriter for ProtobufWriter<W> {
    fn write_sample(&mut self, record: &SampleRecord) -> Result<(), OutputError> {
        let frame = SpnData::from(record);
        self.inner.write_all(&frame.encode_to_vec())?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), OutputError> {
        self.inner.flush()?;
        Ok(())
    }
}
